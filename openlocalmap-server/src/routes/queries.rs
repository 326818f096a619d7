//! Overpass queries used by the route pipeline.
//!
//! Mode tag sets are fixed. Each tag group becomes one bbox-scoped selector
//! inside a union.

use std::time::Duration;

use crate::domain::{BoundingArea, LatLon, TravelMode};
use crate::overpass::{ElementKind, OutMode, OverpassQuery, Selector};

/// One bbox-scoped selection: an element kind plus the tags it must carry.
/// A `None` value means the key only has to be present.
#[derive(Debug, Clone, Copy)]
pub struct TagGroup {
    pub kind: ElementKind,
    pub tags: &'static [(&'static str, Option<&'static str>)],
}

impl TagGroup {
    const fn relation(tags: &'static [(&'static str, Option<&'static str>)]) -> Self {
        Self {
            kind: ElementKind::Relation,
            tags,
        }
    }

    const fn way(tags: &'static [(&'static str, Option<&'static str>)]) -> Self {
        Self {
            kind: ElementKind::Way,
            tags,
        }
    }

    const fn node(tags: &'static [(&'static str, Option<&'static str>)]) -> Self {
        Self {
            kind: ElementKind::Node,
            tags,
        }
    }

    pub fn selector(&self, area: BoundingArea) -> Selector {
        self.tags.iter().fold(
            Selector::new(self.kind).in_bbox(area),
            |selector, (key, value)| match value {
                Some(value) => selector.tag(*key, *value),
                None => selector.has(*key),
            },
        )
    }
}

const WALKING: &[TagGroup] = &[
    TagGroup::relation(&[("type", Some("route")), ("route", Some("hiking"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("foot"))]),
    TagGroup::way(&[("highway", Some("path"))]),
    TagGroup::way(&[("highway", Some("footway"))]),
    TagGroup::way(&[("highway", Some("track")), ("tracktype", Some("grade1"))]),
    TagGroup::way(&[("highway", Some("steps"))]),
];

const BIKING_WAYS: &[TagGroup] = &[
    TagGroup::way(&[("highway", Some("cycleway"))]),
    TagGroup::way(&[("cycleway", None)]),
    TagGroup::way(&[("highway", Some("path")), ("bicycle", Some("yes"))]),
];

const BIKING: &[TagGroup] = &[
    TagGroup::relation(&[("type", Some("route")), ("route", Some("bicycle"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("mtb"))]),
    BIKING_WAYS[0],
    BIKING_WAYS[1],
    BIKING_WAYS[2],
];

const PUBLIC_TRANSPORT: &[TagGroup] = &[
    TagGroup::relation(&[("type", Some("route")), ("route", Some("bus"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("tram"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("subway"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("train"))]),
    TagGroup::relation(&[("type", Some("route")), ("route", Some("light_rail"))]),
];

const EXPANDED_WALKING: &[TagGroup] = &[
    TagGroup::way(&[("highway", Some("path"))]),
    TagGroup::way(&[("highway", Some("footway"))]),
    TagGroup::way(&[("highway", Some("track"))]),
    TagGroup::way(&[("highway", Some("steps"))]),
];

const EXPANDED_PUBLIC_TRANSPORT: &[TagGroup] = &[
    TagGroup::node(&[("highway", Some("bus_stop"))]),
    TagGroup::node(&[("public_transport", Some("stop_position"))]),
];

const SYNTHETIC_WALKING: &[TagGroup] = &[
    TagGroup::way(&[("highway", Some("path"))]),
    TagGroup::way(&[("highway", Some("footway"))]),
];

const SYNTHETIC_BIKING: &[TagGroup] = &[
    TagGroup::way(&[("highway", Some("cycleway"))]),
    TagGroup::way(&[("cycleway", None)]),
];

/// Tag groups of the per-mode route query.
pub fn mode_groups(mode: TravelMode) -> &'static [TagGroup] {
    match mode {
        TravelMode::Walking => WALKING,
        TravelMode::Biking => BIKING,
        TravelMode::PublicTransport => PUBLIC_TRANSPORT,
    }
}

/// Tag groups of the looser query run over the expanded area.
pub fn expanded_groups(mode: TravelMode) -> &'static [TagGroup] {
    match mode {
        TravelMode::Walking => EXPANDED_WALKING,
        TravelMode::Biking => BIKING_WAYS,
        TravelMode::PublicTransport => EXPANDED_PUBLIC_TRANSPORT,
    }
}

/// Tag groups whose ways make up a synthetic route. Empty for public
/// transport.
pub fn synthetic_groups(mode: TravelMode) -> &'static [TagGroup] {
    match mode {
        TravelMode::Walking => SYNTHETIC_WALKING,
        TravelMode::Biking => SYNTHETIC_BIKING,
        TravelMode::PublicTransport => &[],
    }
}

fn union_query(
    groups: &[TagGroup],
    area: BoundingArea,
    out: OutMode,
    timeout: Duration,
) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .union(groups.iter().map(|g| g.selector(area)))
        .out(out)
        .build()
}

/// Tag-only query for the routes of `mode` inside `area`.
pub fn mode_query(mode: TravelMode, area: BoundingArea, timeout: Duration) -> OverpassQuery {
    union_query(mode_groups(mode), area, OutMode::Tags, timeout)
}

/// Looser query for the expanded-area retry.
///
/// Public-transport stops need coordinates, so that query asks for bodies.
pub fn expanded_query(mode: TravelMode, area: BoundingArea, timeout: Duration) -> OverpassQuery {
    let out = match mode {
        TravelMode::PublicTransport => OutMode::Body,
        TravelMode::Walking | TravelMode::Biking => OutMode::Tags,
    };
    union_query(expanded_groups(mode), area, out, timeout)
}

/// The relation, its direct members, and those members' nodes.
pub fn relation_walk_query(relation_id: i64, timeout: Duration) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .select(Selector::new(ElementKind::Relation).id(relation_id))
        .out(OutMode::Body)
        .recurse_down()
        .out(OutMode::Body)
        .build()
}

/// Member ways of a relation with inline geometry.
pub fn member_ways_query(relation_id: i64, timeout: Duration) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .select(Selector::new(ElementKind::Relation).id(relation_id))
        .select(Selector::new(ElementKind::Way).relation_members())
        .out(OutMode::Geom)
        .build()
}

/// The relation followed by its direct node members.
pub fn stop_chain_query(relation_id: i64, timeout: Duration) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .select(Selector::new(ElementKind::Relation).id(relation_id))
        .out(OutMode::Body)
        .select(Selector::new(ElementKind::Node).relation_members())
        .out(OutMode::Body)
        .build()
}

/// A single way with its node list, then the nodes' coordinates.
pub fn way_query(way_id: i64, timeout: Duration) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .select(Selector::new(ElementKind::Way).id(way_id))
        .out(OutMode::Body)
        .recurse_down()
        .out(OutMode::SkelQt)
        .build()
}

/// Ways behind a synthetic route, with geometry. `None` for public
/// transport.
pub fn synthetic_query(
    mode: TravelMode,
    area: BoundingArea,
    timeout: Duration,
) -> Option<OverpassQuery> {
    let groups = synthetic_groups(mode);
    if groups.is_empty() {
        return None;
    }
    Some(union_query(groups, area, OutMode::Geom, timeout))
}

/// Highway and railway ways within `radius_m` of `center`, with geometry.
pub fn nearby_ways_query(center: LatLon, radius_m: f64, timeout: Duration) -> OverpassQuery {
    OverpassQuery::builder(timeout)
        .union([
            Selector::new(ElementKind::Way)
                .around(radius_m, center)
                .has("highway"),
            Selector::new(ElementKind::Way)
                .around(radius_m, center)
                .has("railway"),
        ])
        .out(OutMode::Geom)
        .build()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_area() -> impl Strategy<Value = BoundingArea> {
        (-80.0f64..80.0, -170.0f64..170.0, 0.0001f64..5.0, 0.0001f64..5.0).prop_map(
            |(south, west, h, w)| BoundingArea::new(south, west, south + h, west + w).unwrap(),
        )
    }

    proptest! {
        /// Every tag group gets exactly one bbox-scoped block, with the bbox
        /// rendered south,west,north,east
        #[test]
        fn one_bbox_block_per_tag_group(area in arb_area()) {
            let bbox = format!("({})", area.to_overpass_bbox());
            for mode in TravelMode::ALL {
                let query = mode_query(mode, area, Duration::from_secs(30));
                prop_assert_eq!(query.text().matches(&bbox).count(), mode_groups(mode).len());

                for group in mode_groups(mode) {
                    let block = format!("{};", group.selector(area));
                    prop_assert_eq!(query.text().matches(&block).count(), 1);
                }
            }
        }
    }
}
