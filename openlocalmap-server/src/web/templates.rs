//! Askama templates for the route list fragment.

use askama::Template;

use crate::domain::{Route, TravelMode};
use crate::render::FailureHint;
use crate::routes::SearchOutcome;
use crate::session::NO_ROUTES;

/// Why an area may have no tagged routes, shown under the empty message.
pub const EMPTY_REASONS: [&str; 3] = [
    "La zona seleccionada és massa petita",
    "Les rutes no estan etiquetades correctament a OpenStreetMap",
    "Les rutes existeixen però amb etiquetes diferents",
];

pub const EMPTY_SUGGESTION: &str = "Proveu amb una ciutat més gran o amb més zones turístiques.";

/// Route list fragment (search results).
#[derive(Template)]
#[template(path = "route_list.html")]
pub struct RouteListTemplate {
    /// Non-empty sections, in mode order
    pub sections: Vec<RouteSectionView>,
    /// Set when results come from the expanded area
    pub expanded: bool,
    /// Advice for failed mode queries, deduplicated
    pub failures: Vec<&'static str>,
    pub empty_message: &'static str,
    pub empty_reasons: &'static [&'static str],
    pub empty_suggestion: &'static str,
}

impl RouteListTemplate {
    /// Sections for `outcome`, each showing at most `limit` routes.
    pub fn from_outcome(outcome: &SearchOutcome, limit: usize) -> Self {
        let sections = TravelMode::ALL
            .into_iter()
            .filter(|mode| !outcome.routes(*mode).is_empty())
            .map(|mode| RouteSectionView::new(mode, outcome.routes(mode), limit))
            .collect();

        let mut failures = Vec::new();
        for failure in &outcome.failures {
            let message = FailureHint::from_error(&failure.error).message();
            if !failures.contains(&message) {
                failures.push(message);
            }
        }

        Self {
            sections,
            expanded: outcome.expanded_area.is_some(),
            failures,
            empty_message: NO_ROUTES,
            empty_reasons: &EMPTY_REASONS,
            empty_suggestion: EMPTY_SUGGESTION,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One mode's section of the list.
#[derive(Debug, Clone)]
pub struct RouteSectionView {
    pub mode: &'static str,
    pub title: &'static str,
    /// Routes found, including those not shown
    pub count: usize,
    pub routes: Vec<RouteView>,
}

impl RouteSectionView {
    fn new(mode: TravelMode, routes: &[Route], limit: usize) -> Self {
        Self {
            mode: mode.as_str(),
            title: mode.section_title(),
            count: routes.len(),
            routes: routes.iter().take(limit).map(RouteView::from_route).collect(),
        }
    }

    /// Routes left out by the limit.
    pub fn hidden(&self) -> usize {
        self.count - self.routes.len()
    }
}

/// Route view model for templates.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub id: String,
    pub name: String,
    pub label: &'static str,
    pub colour: String,
    pub description: Option<String>,
    pub stop_count: usize,
    pub osm_url: Option<String>,
}

impl RouteView {
    pub fn from_route(route: &Route) -> Self {
        Self {
            id: route.id.clone(),
            name: route.name.clone(),
            label: route.mode.label(),
            colour: route.colour().to_string(),
            description: route.details().description,
            stop_count: route.stops.len(),
            osm_url: route.osm_links().map(|links| links.view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundingArea, Tags};
    use crate::overpass::{CancelToken, MockOverpass, OverpassElement, Relation};
    use crate::routes::{RouteSearch, SearchConfig};

    fn named(id: i64) -> OverpassElement {
        OverpassElement::Relation(Relation {
            id,
            members: Vec::new(),
            tags: [("name".to_string(), format!("Ruta {id}"))].into_iter().collect(),
        })
    }

    async fn outcome(mock: MockOverpass) -> SearchOutcome {
        RouteSearch::new(mock, SearchConfig::default())
            .search(BoundingArea::VILANOVA, &CancelToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sections_are_limited_but_counted() {
        let mock = MockOverpass::new().reply("route=hiking", (1..=12).map(named).collect());
        let template = RouteListTemplate::from_outcome(&outcome(mock).await, 10);

        assert_eq!(template.sections.len(), 1);
        let section = &template.sections[0];
        assert_eq!(section.count, 12);
        assert_eq!(section.routes.len(), 10);
        assert_eq!(section.hidden(), 2);

        let html = template.render().unwrap();
        assert!(html.contains("Rutes a peu (12)"));
        assert!(html.contains("data-route-id=\"relation_1\""));
        assert!(!html.contains("relation_11"));
    }

    #[tokio::test]
    async fn empty_outcome_explains_itself() {
        let template = RouteListTemplate::from_outcome(&outcome(MockOverpass::new()).await, 10);

        assert!(template.is_empty());
        let html = template.render().unwrap();
        assert!(html.contains("La zona seleccionada és massa petita"));
        assert!(html.contains(EMPTY_SUGGESTION));
    }

    #[test]
    fn route_view_uses_mode_label() {
        let route = Route::from_relation(TravelMode::Biking, 3, "Via verda".into(), Tags::new());
        let view = RouteView::from_route(&route);
        assert_eq!(view.label, "Ruta en bicicleta");
        assert_eq!(view.colour, "#4ECDC4");
        assert!(view.osm_url.unwrap().ends_with("/relation/3"));
    }
}
