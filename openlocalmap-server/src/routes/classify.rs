//! Raw Overpass elements to routes.

use tracing::debug;

use crate::domain::{BoundingArea, NamePreferences, Route, Tags, TravelMode};
use crate::overpass::OverpassElement;

/// Turns the elements of one mode query into routes.
///
/// Carries the area the elements were fetched for, which synthetic routes
/// remember so their geometry can be re-queried later.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    area: BoundingArea,
    names: &'a NamePreferences,
}

impl<'a> Classifier<'a> {
    pub fn new(area: BoundingArea, names: &'a NamePreferences) -> Self {
        Self { area, names }
    }

    pub fn area(&self) -> BoundingArea {
        self.area
    }

    /// Classify `elements` as routes of `mode`.
    ///
    /// Every relation with a `name` or `ref` becomes a route, in encounter
    /// order. Unidentified relations are dropped. When no relation qualifies
    /// but the response holds ways, walking and biking get one synthetic
    /// route standing for those untagged paths; public transport gets
    /// nothing.
    pub fn classify(&self, mode: TravelMode, elements: &[OverpassElement]) -> Vec<Route> {
        let mut routes = Vec::new();
        let mut ways = 0usize;
        let mut dropped = 0usize;

        for element in elements {
            match element {
                OverpassElement::Relation(relation) => {
                    if !is_identified(&relation.tags) {
                        dropped += 1;
                        continue;
                    }
                    let name = self
                        .names
                        .display_name(&relation.tags, mode.default_route_name());
                    routes.push(Route::from_relation(
                        mode,
                        relation.id,
                        name,
                        relation.tags.clone(),
                    ));
                }
                OverpassElement::Way(_) => ways += 1,
                OverpassElement::Node(_) | OverpassElement::Unknown => {}
            }
        }

        if routes.is_empty() && ways > 0 {
            routes.extend(Route::synthetic(mode, self.area));
        }

        debug!(
            %mode,
            elements = elements.len(),
            ways,
            dropped,
            routes = routes.len(),
            "classified elements"
        );

        routes
    }
}

/// Whether a relation carries a non-empty `name` or `ref`.
fn is_identified(tags: &Tags) -> bool {
    ["name", "ref"]
        .iter()
        .any(|key| tags.get(*key).is_some_and(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OsmRef;
    use crate::overpass::{Node, Relation, Way};

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn relation(id: i64, pairs: &[(&str, &str)]) -> OverpassElement {
        OverpassElement::Relation(Relation {
            id,
            members: Vec::new(),
            tags: tags(pairs),
        })
    }

    fn way(id: i64) -> OverpassElement {
        OverpassElement::Way(Way {
            id,
            nodes: Vec::new(),
            geometry: None,
            center: None,
            tags: tags(&[("highway", "path")]),
        })
    }

    fn classify(mode: TravelMode, elements: &[OverpassElement]) -> Vec<Route> {
        let names = NamePreferences::default();
        Classifier::new(BoundingArea::VILANOVA, &names).classify(mode, elements)
    }

    #[test]
    fn named_relations_become_routes_in_order() {
        let routes = classify(
            TravelMode::Walking,
            &[
                relation(2, &[("name", "GR 92")]),
                way(10),
                relation(1, &[("ref", "PR-C 37")]),
            ],
        );

        let ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["relation_2", "relation_1"]);
        assert_eq!(routes[0].name, "GR 92");
        assert_eq!(routes[1].name, "PR-C 37");
        assert_eq!(routes[0].tags.get("name").map(String::as_str), Some("GR 92"));
    }

    #[test]
    fn synthetic_route_when_only_ways() {
        let routes = classify(TravelMode::Walking, &[way(1), way(2), relation(3, &[])]);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, "walking_paths_synthetic");
        assert_eq!(routes[0].name, "Camins i senders locals");
        assert!(routes[0].tags.is_empty());
        assert_eq!(routes[0].osm, OsmRef::Synthetic(BoundingArea::VILANOVA));

        let routes = classify(TravelMode::Biking, &[way(1)]);
        assert_eq!(routes[0].id, "cycling_paths_synthetic");
    }

    #[test]
    fn nothing_from_nothing() {
        assert!(classify(TravelMode::Walking, &[]).is_empty());

        let node = OverpassElement::Node(Node {
            id: 1,
            lat: Some(41.2),
            lon: Some(1.7),
            tags: Tags::new(),
        });
        assert!(classify(TravelMode::Biking, &[node]).is_empty());
    }

    #[test]
    fn unnamed_transit_relations_dropped() {
        let routes = classify(
            TravelMode::PublicTransport,
            &[
                relation(1, &[("route", "bus")]),
                relation(2, &[("route", "bus"), ("name", "Bus 1")]),
                relation(3, &[("route", "bus"), ("name", "  ")]),
                way(4),
            ],
        );

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, "relation_2");
    }

    #[test]
    fn transit_never_synthetic() {
        assert!(classify(TravelMode::PublicTransport, &[way(1), way(2)]).is_empty());
    }

    #[test]
    fn localized_name_preferred_over_ref() {
        let names = NamePreferences::new(["es"]);
        let routes = Classifier::new(BoundingArea::VILANOVA, &names).classify(
            TravelMode::PublicTransport,
            &[relation(
                7,
                &[("ref", "L3"), ("name:es", "Línea 3"), ("route", "bus")],
            )],
        );
        assert_eq!(routes[0].name, "Línea 3");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::overpass::{Node, Relation, Way};
    use proptest::prelude::*;

    fn arb_tags() -> impl Strategy<Value = Tags> {
        proptest::collection::btree_map(
            prop_oneof![
                Just("name".to_string()),
                Just("ref".to_string()),
                Just("name:ca".to_string()),
                Just("route".to_string()),
            ],
            prop_oneof![Just(String::new()), "[a-z ]{1,8}"],
            0..4,
        )
    }

    fn arb_element() -> impl Strategy<Value = OverpassElement> {
        prop_oneof![
            (any::<i64>(), arb_tags()).prop_map(|(id, tags)| {
                OverpassElement::Relation(Relation {
                    id,
                    members: Vec::new(),
                    tags,
                })
            }),
            (any::<i64>(), arb_tags()).prop_map(|(id, tags)| {
                OverpassElement::Way(Way {
                    id,
                    nodes: Vec::new(),
                    geometry: None,
                    center: None,
                    tags,
                })
            }),
            (any::<i64>(), arb_tags()).prop_map(|(id, tags)| {
                OverpassElement::Node(Node {
                    id,
                    lat: None,
                    lon: None,
                    tags,
                })
            }),
        ]
    }

    fn arb_mode() -> impl Strategy<Value = TravelMode> {
        prop_oneof![
            Just(TravelMode::Walking),
            Just(TravelMode::Biking),
            Just(TravelMode::PublicTransport),
        ]
    }

    proptest! {
        /// Classifying twice yields identical routes in identical order
        #[test]
        fn classify_is_idempotent(
            mode in arb_mode(),
            elements in proptest::collection::vec(arb_element(), 0..20),
        ) {
            let names = NamePreferences::default();
            let classifier = Classifier::new(BoundingArea::VILANOVA, &names);
            prop_assert_eq!(
                classifier.classify(mode, &elements),
                classifier.classify(mode, &elements)
            );
        }

        /// Public transport output only holds identified relations
        #[test]
        fn transit_routes_are_identified(
            elements in proptest::collection::vec(arb_element(), 0..20),
        ) {
            let names = NamePreferences::default();
            let routes = Classifier::new(BoundingArea::VILANOVA, &names)
                .classify(TravelMode::PublicTransport, &elements);
            for route in routes {
                prop_assert!(route.relation_id().is_some());
                prop_assert!(is_identified(&route.tags));
            }
        }

        /// At most one synthetic route, and only when no relation qualified
        #[test]
        fn synthetic_route_rule(
            mode in arb_mode(),
            elements in proptest::collection::vec(arb_element(), 0..20),
        ) {
            let names = NamePreferences::default();
            let routes = Classifier::new(BoundingArea::VILANOVA, &names).classify(mode, &elements);
            let synthetic = routes.iter().filter(|r| r.relation_id().is_none()).count();
            prop_assert!(synthetic <= 1);
            if synthetic == 1 {
                prop_assert_eq!(routes.len(), 1);
                prop_assert!(elements.iter().any(|e| e.as_way().is_some()));
            }
        }
    }
}
