//! Area route search.
//!
//! Runs the three mode queries concurrently, classifies whatever came back,
//! and when an area turns up nothing at all retries once over a larger area
//! with looser tags.

use tracing::{info, warn};

use crate::domain::{BoundingArea, Route, RouteGeometry, Stop, TravelMode};
use crate::overpass::{CancelToken, OverpassElement, OverpassError, QueryExecutor};

use super::classify::Classifier;
use super::config::SearchConfig;
use super::geometry::GeometryResolver;
use super::queries::{expanded_query, mode_query};
use super::stops::{StopSequencer, fallback_stops};

/// Which pass of a search a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Initial,
    Expanded,
}

/// A mode query that failed and was treated as empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeFailure {
    pub mode: TravelMode,
    pub stage: SearchStage,
    pub error: OverpassError,
}

/// Result of an area search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The area that was searched.
    pub area: BoundingArea,
    pub walking: Vec<Route>,
    pub biking: Vec<Route>,
    pub public_transport: Vec<Route>,
    /// Set when the expanded retry ran.
    pub expanded_area: Option<BoundingArea>,
    /// Mode queries that failed.
    pub failures: Vec<ModeFailure>,
}

impl SearchOutcome {
    fn new(area: BoundingArea) -> Self {
        Self {
            area,
            walking: Vec::new(),
            biking: Vec::new(),
            public_transport: Vec::new(),
            expanded_area: None,
            failures: Vec::new(),
        }
    }

    pub fn routes(&self, mode: TravelMode) -> &[Route] {
        match mode {
            TravelMode::Walking => &self.walking,
            TravelMode::Biking => &self.biking,
            TravelMode::PublicTransport => &self.public_transport,
        }
    }

    fn routes_mut(&mut self, mode: TravelMode) -> &mut Vec<Route> {
        match mode {
            TravelMode::Walking => &mut self.walking,
            TravelMode::Biking => &mut self.biking,
            TravelMode::PublicTransport => &mut self.public_transport,
        }
    }

    /// All routes, walking then biking then public transport.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.walking
            .iter()
            .chain(&self.biking)
            .chain(&self.public_transport)
    }

    pub fn total(&self) -> usize {
        self.walking.len() + self.biking.len() + self.public_transport.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Route with the given id.
    pub fn find(&self, id: &str) -> Option<&Route> {
        self.iter().find(|r| r.id == id)
    }

    /// Whether every query of the initial pass failed.
    pub fn all_failed(&self) -> bool {
        TravelMode::ALL.iter().all(|mode| {
            self.failures
                .iter()
                .any(|f| f.mode == *mode && f.stage == SearchStage::Initial)
        })
    }

    /// The first recorded failure, if any.
    pub fn first_failure(&self) -> Option<&OverpassError> {
        self.failures.first().map(|f| &f.error)
    }
}

/// Route discovery over an Overpass executor.
///
/// Owns the executor and configuration; stop and geometry lookups for
/// selected routes go through the same executor.
pub struct RouteSearch<E> {
    executor: E,
    config: SearchConfig,
}

impl<E: QueryExecutor> RouteSearch<E> {
    pub fn new(executor: E, config: SearchConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn stops(&self) -> StopSequencer<'_, E> {
        StopSequencer::new(&self.executor, &self.config)
    }

    pub fn geometry(&self) -> GeometryResolver<'_, E> {
        GeometryResolver::new(&self.executor, &self.config)
    }

    /// Ordered stops of a public-transport relation.
    pub async fn fetch_ordered_stops(
        &self,
        relation_id: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<Stop>, OverpassError> {
        self.stops().fetch_ordered_stops(relation_id, cancel).await
    }

    /// Drawable geometry of a route.
    pub async fn resolve_geometry(
        &self,
        route: &Route,
        cancel: &CancelToken,
    ) -> Result<RouteGeometry, OverpassError> {
        self.geometry().resolve(route, cancel).await
    }

    /// Search `area` for routes of every mode.
    ///
    /// Individual mode failures are recorded in the outcome and treated as
    /// empty; the only error is cancellation. The expanded-area retry runs
    /// only when every collection is empty and at least one mode query
    /// succeeded, so an area where all three queries failed is not retried.
    pub async fn search(
        &self,
        area: BoundingArea,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, OverpassError> {
        let mut outcome = SearchOutcome::new(area);
        let timeout = self.config.tag_query();

        let [walking_query, biking_query, transport_query] =
            TravelMode::ALL.map(|mode| mode_query(mode, area, timeout));

        let (walking, biking, transport) = tokio::join!(
            self.executor.execute(&walking_query, cancel),
            self.executor.execute(&biking_query, cancel),
            self.executor.execute(&transport_query, cancel),
        );

        let classifier = Classifier::new(area, &self.config.names);
        for (mode, result) in TravelMode::ALL.into_iter().zip([walking, biking, transport]) {
            let elements = settle(&mut outcome, mode, SearchStage::Initial, result, cancel)?;
            *outcome.routes_mut(mode) = classifier.classify(mode, &elements);
        }

        info!(
            %area,
            walking = outcome.walking.len(),
            biking = outcome.biking.len(),
            public_transport = outcome.public_transport.len(),
            failed = outcome.failures.len(),
            "area search"
        );

        if outcome.is_empty() && !outcome.all_failed() {
            self.search_expanded(&mut outcome, cancel).await?;
        }

        Ok(outcome)
    }

    /// The single expanded-area retry.
    async fn search_expanded(
        &self,
        outcome: &mut SearchOutcome,
        cancel: &CancelToken,
    ) -> Result<(), OverpassError> {
        let area = outcome.area.expanded(self.config.expansion_factor);
        let timeout = self.config.expanded_query();
        info!(original = %outcome.area, expanded = %area, "nothing found, searching expanded area");

        let [walking_query, biking_query, transport_query] =
            TravelMode::ALL.map(|mode| expanded_query(mode, area, timeout));

        let (walking, biking, transport) = tokio::join!(
            self.executor.execute(&walking_query, cancel),
            self.executor.execute(&biking_query, cancel),
            self.executor.execute(&transport_query, cancel),
        );

        outcome.expanded_area = Some(area);
        let classifier = Classifier::new(area, &self.config.names);

        let walking = settle(outcome, TravelMode::Walking, SearchStage::Expanded, walking, cancel)?;
        outcome.walking = classifier.classify(TravelMode::Walking, &walking);

        let biking = settle(outcome, TravelMode::Biking, SearchStage::Expanded, biking, cancel)?;
        outcome.biking = classifier.classify(TravelMode::Biking, &biking);

        let transport = settle(
            outcome,
            TravelMode::PublicTransport,
            SearchStage::Expanded,
            transport,
            cancel,
        )?;
        let stops = fallback_stops(&transport, &self.config.names);
        if !stops.is_empty() {
            info!(stops = stops.len(), "generated bus route from loose stops");
            outcome.public_transport = vec![Route::generated_transit(stops)];
        }

        info!(
            walking = outcome.walking.len(),
            biking = outcome.biking.len(),
            public_transport = outcome.public_transport.len(),
            "expanded area search"
        );

        Ok(())
    }
}

/// Turn one settled mode query into elements, recording a failure as empty.
///
/// Cancellation aborts the whole search instead.
fn settle(
    outcome: &mut SearchOutcome,
    mode: TravelMode,
    stage: SearchStage,
    result: Result<Vec<OverpassElement>, OverpassError>,
    cancel: &CancelToken,
) -> Result<Vec<OverpassElement>, OverpassError> {
    match result {
        Ok(elements) => Ok(elements),
        Err(OverpassError::Cancelled) => Err(OverpassError::Cancelled),
        Err(_) if cancel.is_cancelled() => Err(OverpassError::Cancelled),
        Err(error) => {
            warn!(%mode, ?stage, error = %error, "mode query failed, treating as empty");
            outcome.failures.push(ModeFailure { mode, stage, error });
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
