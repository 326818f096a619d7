//! One user's route browsing session.
//!
//! A session ties [`RouteSearch`] to a [`RenderSurface`]. Searches and route
//! selections are last-write-wins: starting a new one cancels the one in
//! flight, and a result that arrives after it was superseded is dropped
//! without touching the surface. Once a request settles the panel never stays
//! in a loading state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{BoundingArea, LatLon, Route, RouteGeometry, Stop, TravelMode};
use crate::overpass::{CancelToken, OverpassError, QueryExecutor};
use crate::render::{LayerHandle, Marker, MarkerKind, PanelStatus, PolylineStyle, RenderSurface};
use crate::routes::{RouteSearch, SearchOutcome};

pub const SEARCH_LOADING: &str = "Carregant rutes...";
pub const ROUTE_LOADING: &str = "Carregant ruta...";
pub const STOPS_LOADING: &str = "Carregant parades...";
pub const NO_ROUTES: &str =
    "No s'han trobat rutes etiquetades específicament per aquesta ubicació.";
pub const NO_GEOMETRY: &str = "Geometria no disponible per aquesta ruta";
const SEARCH_FAILED: &str = "Error carregant les rutes.";
const ROUTE_FAILED: &str = "Error carregant la ruta.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no route with id {0} in the current search")]
    UnknownRoute(String),

    #[error("superseded by a newer request")]
    Superseded,

    #[error(transparent)]
    Query(#[from] OverpassError),
}

/// A selected route with everything needed to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The route, with stops filled in for public transport.
    pub route: Route,
    pub geometry: RouteGeometry,
}

/// Generation counter for one kind of request.
#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    cancel: Option<CancelToken>,
}

struct Ticket {
    generation: u64,
    cancel: CancelToken,
}

impl Slot {
    /// Supersede whatever is in flight and start a new request.
    fn begin(&mut self) -> Ticket {
        self.abandon();
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        Ticket {
            generation: self.generation,
            cancel,
        }
    }

    /// Cancel the request in flight, if any, and invalidate its ticket.
    fn abandon(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.generation += 1;
    }

    /// Whether `ticket` is still the latest request. Settles it if so.
    fn finish(&mut self, ticket: &Ticket) -> bool {
        if self.generation != ticket.generation {
            return false;
        }
        self.cancel = None;
        true
    }
}

struct SessionState<S> {
    surface: S,
    layer: Option<LayerHandle>,
    search: Slot,
    selection: Slot,
    outcome: Option<SearchOutcome>,
}

impl<S: RenderSurface> SessionState<S> {
    /// The session's route layer, emptied.
    fn reset_layer(&mut self) -> LayerHandle {
        match self.layer {
            Some(layer) => {
                self.surface.clear_layer(layer);
                layer
            }
            None => {
                let layer = self.surface.create_layer();
                self.layer = Some(layer);
                layer
            }
        }
    }

    fn show(&mut self, selection: &Selection) {
        let layer = self.reset_layer();
        let route = &selection.route;

        if !selection.geometry.is_empty() {
            self.surface.draw_polylines(
                layer,
                selection.geometry.polylines(),
                &PolylineStyle::for_route(route),
            );
        }

        let (ordered, loose): (Vec<&Stop>, Vec<&Stop>) =
            route.stops.iter().partition(|stop| stop.is_ordered());
        for (stops, kind) in [(ordered, MarkerKind::OrderedStop), (loose, MarkerKind::LooseStop)] {
            if stops.is_empty() {
                continue;
            }
            let markers: Vec<Marker> = stops
                .into_iter()
                .map(|stop| Marker::for_stop(stop, route))
                .collect();
            self.surface.draw_markers(layer, &markers, kind);
        }

        let points: Vec<LatLon> = selection
            .geometry
            .points()
            .chain(route.stops.iter().map(|stop| stop.position))
            .collect();
        if points.is_empty() {
            self.surface.set_status(PanelStatus::empty(NO_GEOMETRY));
        } else {
            self.surface.fit_to_bounds(&points);
            self.surface.set_status(PanelStatus::ready(route.name.clone()));
        }
    }
}

/// Search results and the selected route, as shown on one surface.
pub struct RouteSession<E, S> {
    search: Arc<RouteSearch<E>>,
    state: Mutex<SessionState<S>>,
}

impl<E: QueryExecutor, S: RenderSurface> RouteSession<E, S> {
    pub fn new(search: Arc<RouteSearch<E>>, surface: S) -> Self {
        Self {
            search,
            state: Mutex::new(SessionState {
                surface,
                layer: None,
                search: Slot::default(),
                selection: Slot::default(),
                outcome: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().surface)
    }

    /// Result of the latest completed search.
    pub fn outcome(&self) -> Option<SearchOutcome> {
        self.lock().outcome.clone()
    }

    /// Search `area`, replacing any previous results.
    ///
    /// Cancels any search or selection in flight and clears the route layer.
    pub async fn search_area(&self, area: BoundingArea) -> Result<SearchOutcome, SessionError> {
        let ticket = {
            let mut state = self.lock();
            state.selection.abandon();
            let ticket = state.search.begin();
            state.outcome = None;
            state.reset_layer();
            state.surface.set_status(PanelStatus::loading(SEARCH_LOADING));
            ticket
        };

        let result = self.search.search(area, &ticket.cancel).await;

        let mut state = self.lock();
        if !state.search.finish(&ticket) {
            debug!(%area, "dropping superseded search");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(outcome) => {
                info!(%area, routes = outcome.total(), "search shown");
                state.surface.set_status(search_status(&outcome));
                state.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Err(error) => {
                warn!(%area, %error, "search aborted");
                state.surface.set_status(PanelStatus::failed(SEARCH_FAILED, &error));
                Err(error.into())
            }
        }
    }

    /// Select a route from the latest search and draw it.
    ///
    /// Public-transport relations load their stops and geometry together.
    pub async fn select_route(&self, route_id: &str) -> Result<Selection, SessionError> {
        let (route, ticket) = {
            let mut state = self.lock();
            let route = state
                .outcome
                .as_ref()
                .and_then(|outcome| outcome.find(route_id))
                .cloned()
                .ok_or_else(|| SessionError::UnknownRoute(route_id.to_string()))?;
            let ticket = state.selection.begin();
            let loading = match route.mode {
                TravelMode::PublicTransport => STOPS_LOADING,
                TravelMode::Walking | TravelMode::Biking => ROUTE_LOADING,
            };
            state.surface.set_status(PanelStatus::loading(loading));
            (route, ticket)
        };

        let result = self.load(route, &ticket.cancel).await;

        let mut state = self.lock();
        if !state.selection.finish(&ticket) {
            debug!(route_id, "dropping superseded selection");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(selection) => {
                info!(
                    route_id,
                    polylines = selection.geometry.len(),
                    stops = selection.route.stops.len(),
                    "route shown"
                );
                state.show(&selection);
                Ok(selection)
            }
            Err(error) => {
                warn!(route_id, %error, "route failed to load");
                state.surface.set_status(PanelStatus::failed(ROUTE_FAILED, &error));
                Err(error.into())
            }
        }
    }

    /// Forget results and cancel everything in flight.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.search.abandon();
        state.selection.abandon();
        state.outcome = None;
        if let Some(layer) = state.layer {
            state.surface.clear_layer(layer);
        }
        state.surface.set_status(PanelStatus::Idle);
    }

    async fn load(&self, mut route: Route, cancel: &CancelToken) -> Result<Selection, OverpassError> {
        match route.relation_id() {
            Some(relation_id) if route.mode == TravelMode::PublicTransport => {
                let (stops, geometry) = tokio::join!(
                    self.search.fetch_ordered_stops(relation_id, cancel),
                    self.search.resolve_geometry(&route, cancel),
                );
                route.stops = stops?;
                Ok(Selection {
                    geometry: geometry?,
                    route,
                })
            }
            _ => {
                let geometry = self.search.resolve_geometry(&route, cancel).await?;
                Ok(Selection { route, geometry })
            }
        }
    }
}

fn search_status(outcome: &SearchOutcome) -> PanelStatus {
    if !outcome.is_empty() {
        return PanelStatus::ready(format!("{} rutes trobades", outcome.total()));
    }
    match outcome.first_failure() {
        Some(error) if outcome.all_failed() => PanelStatus::failed(SEARCH_FAILED, error),
        _ => PanelStatus::empty(NO_ROUTES),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::Tags;
    use crate::overpass::{
        Member, MemberType, MockOverpass, Node, OverpassElement, OverpassQuery, Relation, Way,
    };
    use crate::render::{FailureHint, RecordingSurface};
    use crate::routes::SearchConfig;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn relation(id: i64, name: &str, members: Vec<Member>) -> OverpassElement {
        OverpassElement::Relation(Relation {
            id,
            members,
            tags: tags(&[("type", "route"), ("name", name)]),
        })
    }

    fn stop_member(node: i64) -> Member {
        Member {
            member_type: MemberType::Node,
            ref_id: node,
            role: "stop".to_string(),
        }
    }

    fn node(id: i64, name: &str, lat: f64, lon: f64) -> OverpassElement {
        OverpassElement::Node(Node {
            id,
            lat: Some(lat),
            lon: Some(lon),
            tags: tags(&[("name", name)]),
        })
    }

    fn way_with_geometry(id: i64, points: &[(f64, f64)]) -> OverpassElement {
        OverpassElement::Way(Way {
            id,
            nodes: Vec::new(),
            geometry: Some(points.iter().map(|&(lat, lon)| LatLon::new(lat, lon)).collect()),
            center: None,
            tags: Tags::new(),
        })
    }

    fn session<E: QueryExecutor>(executor: E) -> RouteSession<E, RecordingSurface> {
        RouteSession::new(
            Arc::new(RouteSearch::new(executor, SearchConfig::default())),
            RecordingSurface::new(),
        )
    }

    fn hiking_mock() -> MockOverpass {
        MockOverpass::new()
            .reply(
                "route=hiking",
                vec![relation(1, "GR 92", vec![]), relation(2, "GR 5", vec![])],
            )
            .reply(
                "relation(1);way(r)",
                vec![way_with_geometry(10, &[(41.21, 1.71), (41.22, 1.72)])],
            )
            .reply(
                "relation(2);way(r)",
                vec![way_with_geometry(20, &[(41.23, 1.73), (41.24, 1.74)])],
            )
    }

    fn drawn_way_starts(session: &RouteSession<impl QueryExecutor, RecordingSurface>) -> Vec<f64> {
        session.with_surface(|s| {
            s.layers()
                .flat_map(|layer| layer.polylines.iter().map(|(line, _)| line[0].lat))
                .collect()
        })
    }

    #[tokio::test]
    async fn search_reports_route_count() {
        let session = session(hiking_mock());

        let outcome = session.search_area(BoundingArea::VILANOVA).await.unwrap();

        assert_eq!(outcome.walking.len(), 2);
        session.with_surface(|s| {
            assert_eq!(s.statuses()[0], PanelStatus::loading(SEARCH_LOADING));
            assert_eq!(s.status(), Some(&PanelStatus::ready("2 rutes trobades")));
        });
        assert!(session.outcome().is_some());
    }

    #[tokio::test]
    async fn empty_search_is_not_a_failure() {
        let session = session(MockOverpass::new());

        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        session.with_surface(|s| {
            assert_eq!(s.status(), Some(&PanelStatus::empty(NO_ROUTES)));
        });
    }

    #[tokio::test]
    async fn search_with_every_mode_failing_shows_hint() {
        let mock = MockOverpass::new().fail(
            "[timeout:30]",
            OverpassError::Status {
                status: 504,
                body: String::new(),
            },
        );
        let session = session(mock);

        let outcome = session.search_area(BoundingArea::VILANOVA).await.unwrap();

        assert!(outcome.all_failed());
        session.with_surface(|s| match s.status() {
            Some(PanelStatus::Failed { hint, .. }) => assert_eq!(*hint, FailureHint::SmallerArea),
            other => panic!("unexpected status {other:?}"),
        });
    }

    #[tokio::test]
    async fn selecting_a_walking_route_draws_its_ways() {
        let session = session(hiking_mock());
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let selection = session.select_route("relation_1").await.unwrap();

        assert_eq!(selection.geometry.len(), 1);
        assert_eq!(drawn_way_starts(&session), vec![41.21]);
        session.with_surface(|s| {
            let (_, style) = &s.layers().next().unwrap().polylines[0];
            assert_eq!(style.colour, "#FF6B35");
            assert_eq!(s.fits().len(), 1);
            assert_eq!(s.status(), Some(&PanelStatus::ready("GR 92")));
        });
    }

    #[tokio::test]
    async fn public_transport_selection_loads_stops_and_geometry() {
        let mock = MockOverpass::new()
            .reply("route=bus", vec![relation(7, "L1", vec![])])
            .reply(
                "relation(7);out body;>;",
                vec![
                    relation(7, "L1", vec![stop_member(100), stop_member(101)]),
                    node(100, "Estació", 41.21, 1.72),
                    node(101, "Platja", 41.22, 1.73),
                ],
            )
            .reply(
                "relation(7);way(r)",
                vec![way_with_geometry(70, &[(41.21, 1.72), (41.22, 1.73)])],
            );
        let session = session(mock.clone());
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let selection = session.select_route("relation_7").await.unwrap();

        let names: Vec<&str> = selection.route.stops.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Estació", "Platja"]);
        assert_eq!(mock.count_matching("relation(7)"), 2);

        session.with_surface(|s| {
            let layer = s.layers().next().unwrap();
            assert_eq!(layer.polylines.len(), 1);
            assert_eq!(layer.markers.len(), 2);
            let (marker, kind) = &layer.markers[0];
            assert_eq!(*kind, MarkerKind::OrderedStop);
            assert_eq!(marker.label, "1. Estació");
            assert_eq!(marker.popup, "Estació\nParada de L1");
            assert_eq!(s.fits()[0].len(), 4);
            assert_eq!(s.statuses()[2], PanelStatus::loading(STOPS_LOADING));
        });
    }

    #[tokio::test]
    async fn failed_selection_leaves_loading_state() {
        let mock = MockOverpass::new()
            .reply("route=hiking", vec![relation(1, "GR 92", vec![])])
            .fail(
                "way(r)",
                OverpassError::Status {
                    status: 429,
                    body: String::new(),
                },
            );
        let session = session(mock);
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let err = session.select_route("relation_1").await.unwrap_err();

        assert!(matches!(err, SessionError::Query(_)));
        session.with_surface(|s| match s.status() {
            Some(PanelStatus::Failed { hint, .. }) => assert_eq!(*hint, FailureHint::WaitAndRetry),
            other => panic!("unexpected status {other:?}"),
        });
    }

    #[tokio::test]
    async fn route_without_geometry_reports_it() {
        let mock = MockOverpass::new().reply("route=hiking", vec![relation(3, "Ruta", vec![])]);
        let session = session(mock);
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let selection = session.select_route("relation_3").await.unwrap();

        assert!(selection.geometry.is_empty());
        session.with_surface(|s| {
            assert!(s.fits().is_empty());
            assert_eq!(s.status(), Some(&PanelStatus::empty(NO_GEOMETRY)));
        });
    }

    #[tokio::test]
    async fn unknown_route_is_rejected() {
        let session = session(hiking_mock());

        let err = session.select_route("relation_1").await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownRoute(_)));

        session.search_area(BoundingArea::VILANOVA).await.unwrap();
        let err = session.select_route("relation_99").await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownRoute(id) if id == "relation_99"));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_selection_cancels_older() {
        let mock = hiking_mock().with_delay(Duration::from_millis(100));
        let session = Arc::new(session(mock));
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.select_route("relation_1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        session.select_route("relation_2").await.unwrap();

        assert!(matches!(first.await.unwrap(), Err(SessionError::Superseded)));
        assert_eq!(drawn_way_starts(&*session), vec![41.23]);
        session.with_surface(|s| {
            assert_eq!(s.status(), Some(&PanelStatus::ready("GR 5")));
        });
    }

    /// Executor that never observes cancellation.
    #[derive(Clone)]
    struct IgnoresCancel(MockOverpass);

    impl QueryExecutor for IgnoresCancel {
        async fn execute(
            &self,
            query: &OverpassQuery,
            _cancel: &CancelToken,
        ) -> Result<Vec<OverpassElement>, OverpassError> {
            self.0.execute(query, &CancelToken::new()).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_of_superseded_selection_is_dropped() {
        let mock = IgnoresCancel(hiking_mock().with_delay(Duration::from_millis(100)));
        let session = Arc::new(session(mock));
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.select_route("relation_1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = session.select_route("relation_2");

        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first.unwrap(), Err(SessionError::Superseded)));
        assert!(second.is_ok());
        assert_eq!(drawn_way_starts(&*session), vec![41.23]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_search_supersedes_selection() {
        let mock = hiking_mock().with_delay(Duration::from_millis(100));
        let session = Arc::new(session(mock));
        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        let selection = tokio::spawn({
            let session = session.clone();
            async move { session.select_route("relation_1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        session.search_area(BoundingArea::VILANOVA).await.unwrap();

        assert!(matches!(selection.await.unwrap(), Err(SessionError::Superseded)));
        assert!(drawn_way_starts(&*session).is_empty());
        session.with_surface(|s| {
            assert_eq!(s.status(), Some(&PanelStatus::ready("2 rutes trobades")));
        });
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let session = session(hiking_mock());
        session.search_area(BoundingArea::VILANOVA).await.unwrap();
        session.select_route("relation_1").await.unwrap();

        session.clear();

        assert!(session.outcome().is_none());
        assert!(drawn_way_starts(&session).is_empty());
        session.with_surface(|s| assert_eq!(s.status(), Some(&PanelStatus::Idle)));
        assert!(matches!(
            session.select_route("relation_1").await,
            Err(SessionError::UnknownRoute(_))
        ));
    }
}
