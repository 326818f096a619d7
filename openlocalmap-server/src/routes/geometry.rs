//! Drawable geometry for routes.
//!
//! Relations try their member ways first, then a chain through their ordered
//! stops, then (if enabled) ways near those stops. "No geometry" is a normal
//! outcome and comes back as an empty [`RouteGeometry`]; only query failures
//! are errors.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::{BoundingArea, OsmRef, Polyline, Route, RouteGeometry, TravelMode, centroid};
use crate::overpass::{CancelToken, Node, OverpassElement, OverpassError, QueryExecutor, Way};

use super::config::SearchConfig;
use super::queries::{
    member_ways_query, nearby_ways_query, stop_chain_query, synthetic_query, way_query,
};
use super::stops::{node_index, ordered_stops};

/// Resolves route geometry through Overpass.
pub struct GeometryResolver<'a, E> {
    executor: &'a E,
    config: &'a SearchConfig,
}

impl<'a, E: QueryExecutor> GeometryResolver<'a, E> {
    pub fn new(executor: &'a E, config: &'a SearchConfig) -> Self {
        Self { executor, config }
    }

    /// Geometry for `route`, dispatching on where it came from.
    pub async fn resolve(
        &self,
        route: &Route,
        cancel: &CancelToken,
    ) -> Result<RouteGeometry, OverpassError> {
        match route.osm {
            OsmRef::Relation(id) => self.relation_geometry(id, cancel).await,
            OsmRef::Way(id) => self.way_geometry(id, cancel).await,
            OsmRef::Synthetic(area) => self.synthetic_geometry(route.mode, area, cancel).await,
            OsmRef::Generated => Ok(RouteGeometry::empty()),
        }
    }

    /// Member-way polylines, falling back to the stop chain and then to the
    /// nearby-way search.
    pub async fn relation_geometry(
        &self,
        relation_id: i64,
        cancel: &CancelToken,
    ) -> Result<RouteGeometry, OverpassError> {
        let query = member_ways_query(relation_id, self.config.relation_geometry());
        let elements = self.executor.execute(&query, cancel).await?;
        let geometry = RouteGeometry::new(way_polylines(&elements));
        if !geometry.is_empty() {
            debug!(relation_id, polylines = geometry.len(), "relation member ways");
            return Ok(geometry);
        }

        let query = stop_chain_query(relation_id, self.config.stop_chain());
        let elements = self.executor.execute(&query, cancel).await?;
        let stops: Polyline = ordered_stops(relation_id, &elements, &self.config.names)
            .iter()
            .map(|stop| stop.position)
            .collect();

        let geometry = RouteGeometry::new([stops.clone()]);
        if !geometry.is_empty() {
            info!(relation_id, stops = stops.len(), "relation has no ways, drew stop chain");
            return Ok(geometry);
        }

        if self.config.nearby_fallback {
            if let Some(center) = centroid(stops.iter().copied()) {
                let query =
                    nearby_ways_query(center, self.config.nearby_radius_m, self.config.nearby_query());
                let elements = self.executor.execute(&query, cancel).await?;
                let geometry = RouteGeometry::new(way_polylines(&elements));
                info!(
                    relation_id,
                    polylines = geometry.len(),
                    "using ways near the relation's stops"
                );
                return Ok(geometry);
            }
        }

        info!(relation_id, "no geometry available for relation");
        Ok(RouteGeometry::empty())
    }

    /// One polyline from the way's node sequence.
    pub async fn way_geometry(
        &self,
        way_id: i64,
        cancel: &CancelToken,
    ) -> Result<RouteGeometry, OverpassError> {
        let query = way_query(way_id, self.config.way_geometry());
        let elements = self.executor.execute(&query, cancel).await?;

        let nodes = node_index(&elements);
        let polyline = elements
            .iter()
            .filter_map(OverpassElement::as_way)
            .find(|way| way.id == way_id)
            .map(|way| way_points(way, &nodes))
            .unwrap_or_default();

        Ok(RouteGeometry::new([polyline]))
    }

    /// Every tagged way of the mode inside the route's originating area.
    pub async fn synthetic_geometry(
        &self,
        mode: TravelMode,
        area: BoundingArea,
        cancel: &CancelToken,
    ) -> Result<RouteGeometry, OverpassError> {
        let Some(query) = synthetic_query(mode, area, self.config.synthetic_geometry()) else {
            return Ok(RouteGeometry::empty());
        };
        let elements = self.executor.execute(&query, cancel).await?;
        let geometry = RouteGeometry::new(way_polylines(&elements));
        debug!(%mode, %area, polylines = geometry.len(), "synthetic route geometry");
        Ok(geometry)
    }
}

/// One polyline per way in `elements`.
fn way_polylines(elements: &[OverpassElement]) -> Vec<Polyline> {
    let nodes = node_index(elements);
    elements
        .iter()
        .filter_map(OverpassElement::as_way)
        .map(|way| way_points(way, &nodes))
        .collect()
}

/// Inline geometry when present, otherwise the way's nodes looked up in
/// `nodes`. Nodes without coordinates are skipped.
fn way_points(way: &Way, nodes: &HashMap<i64, &Node>) -> Polyline {
    match &way.geometry {
        Some(points) => points.clone(),
        None => way
            .nodes
            .iter()
            .filter_map(|id| nodes.get(id).and_then(|n| n.position()))
            .collect(),
    }
}
