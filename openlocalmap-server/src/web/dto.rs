//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{
    BoundingArea, DomainError, OsmLinks, OsmcSymbol, Polyline, Route, RouteDetails, RouteGeometry,
    Stop, Tags, TravelMode,
};
use crate::render::FailureHint;
use crate::routes::{ModeFailure, SearchOutcome, SearchStage};

/// Bounding box query parameters.
///
/// All four edges or none; none means the default area.
#[derive(Debug, Default, Deserialize)]
pub struct BboxQuery {
    pub south: Option<f64>,
    pub west: Option<f64>,
    pub north: Option<f64>,
    pub east: Option<f64>,
}

impl BboxQuery {
    /// The requested area, validated.
    pub fn area(&self) -> Result<BoundingArea, DomainError> {
        match (self.south, self.west, self.north, self.east) {
            (Some(south), Some(west), Some(north), Some(east)) => {
                BoundingArea::new(south, west, north, east)
            }
            (None, None, None, None) => Ok(BoundingArea::default()),
            _ => Err(DomainError::InvalidBounds(
                "south, west, north and east must be given together",
            )),
        }
    }
}

/// Result of an area search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Area that was searched
    pub area: BoundingArea,

    /// Larger area searched when the first pass found nothing
    pub expanded_area: Option<BoundingArea>,

    pub walking: Vec<RouteSummary>,
    pub biking: Vec<RouteSummary>,
    pub public_transport: Vec<RouteSummary>,

    /// Mode queries that failed and were treated as empty
    pub failures: Vec<FailureDto>,
}

impl SearchResponse {
    pub fn from_outcome(outcome: &SearchOutcome) -> Self {
        let summaries = |mode| -> Vec<RouteSummary> {
            outcome
                .routes(mode)
                .iter()
                .map(RouteSummary::from_route)
                .collect()
        };
        Self {
            area: outcome.area,
            expanded_area: outcome.expanded_area,
            walking: summaries(TravelMode::Walking),
            biking: summaries(TravelMode::Biking),
            public_transport: summaries(TravelMode::PublicTransport),
            failures: outcome.failures.iter().map(FailureDto::from_failure).collect(),
        }
    }
}

/// A route in search results.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    /// `relation_<id>`, `way_<id>` or a placeholder id
    pub id: String,

    pub mode: TravelMode,
    pub name: String,

    /// `relation`, `way`, `synthetic` or `generated`
    pub osm_type: &'static str,

    /// OSM element id, for relations and ways
    pub osm_id: Option<i64>,

    /// Line colour (hex)
    pub colour: String,

    pub tags: Tags,
    pub details: RouteDetails,
    pub osm_links: Option<OsmLinks>,

    /// Decoded waymark, with its description
    pub osmc_symbol: Option<OsmcSymbol>,
    pub osmc_description: Option<String>,

    /// Stops, only present for the generated bus route
    pub stops: Vec<StopDto>,
}

impl RouteSummary {
    pub fn from_route(route: &Route) -> Self {
        let osmc_symbol = route.osmc_symbol();
        Self {
            id: route.id.clone(),
            mode: route.mode,
            name: route.name.clone(),
            osm_type: route.osm.osm_type(),
            osm_id: route.osm.osm_id(),
            colour: route.colour().to_string(),
            tags: route.tags.clone(),
            details: route.details(),
            osm_links: route.osm_links(),
            osmc_description: osmc_symbol.as_ref().map(OsmcSymbol::describe),
            osmc_symbol,
            stops: route.stops.iter().map(StopDto::from_stop).collect(),
        }
    }
}

/// A stop along a route.
#[derive(Debug, Serialize)]
pub struct StopDto {
    pub osm_id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// 1-based position along the route, absent for unordered stops
    pub order: Option<u32>,

    /// Relation membership role
    pub role: Option<String>,
}

impl StopDto {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            osm_id: stop.osm_id,
            name: stop.name.clone(),
            lat: stop.position.lat,
            lon: stop.position.lon,
            order: stop.order,
            role: stop.role.clone(),
        }
    }
}

/// Stops of a public-transport relation.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub relation_id: i64,

    /// Whether the stops came from the relation's stop roles
    pub ordered: bool,

    pub stops: Vec<StopDto>,
}

impl StopsResponse {
    pub fn new(relation_id: i64, stops: &[Stop]) -> Self {
        Self {
            relation_id,
            ordered: stops.iter().any(Stop::is_ordered),
            stops: stops.iter().map(StopDto::from_stop).collect(),
        }
    }
}

/// Drawable geometry of a route. No polylines means no geometry is known.
#[derive(Debug, Serialize)]
pub struct GeometryResponse {
    pub polylines: Vec<Polyline>,
    pub point_count: usize,
}

impl From<RouteGeometry> for GeometryResponse {
    fn from(geometry: RouteGeometry) -> Self {
        Self {
            point_count: geometry.point_count(),
            polylines: geometry.into_polylines(),
        }
    }
}

/// A failed mode query.
#[derive(Debug, Serialize)]
pub struct FailureDto {
    pub mode: TravelMode,

    /// `initial` or `expanded`
    pub stage: &'static str,

    pub error: String,
    pub hint: FailureHint,
}

impl FailureDto {
    pub fn from_failure(failure: &ModeFailure) -> Self {
        Self {
            mode: failure.mode,
            stage: match failure.stage {
                SearchStage::Initial => "initial",
                SearchStage::Expanded => "expanded",
            },
            error: failure.error.to_string(),
            hint: FailureHint::from_error(&failure.error),
        }
    }
}

/// Error response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short machine-readable kind
    pub error: &'static str,

    /// HTTP status code, repeated from the response line
    pub status: u16,

    pub message: String,

    /// Advice for the user, when there is any
    pub hint: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LatLon;

    #[test]
    fn bbox_defaults_and_validation() {
        assert_eq!(BboxQuery::default().area(), Ok(BoundingArea::VILANOVA));

        let partial = BboxQuery {
            south: Some(41.0),
            ..Default::default()
        };
        assert!(partial.area().is_err());

        let inverted = BboxQuery {
            south: Some(42.0),
            west: Some(1.0),
            north: Some(41.0),
            east: Some(2.0),
        };
        assert!(inverted.area().is_err());
    }

    #[test]
    fn summary_of_generated_route() {
        let stop = Stop {
            osm_id: 5,
            name: "Rambla".into(),
            position: LatLon::new(41.22, 1.72),
            order: None,
            role: None,
            tags: Tags::new(),
        };
        let summary = RouteSummary::from_route(&Route::generated_transit(vec![stop]));

        assert_eq!(summary.osm_type, "generated");
        assert_eq!(summary.osm_id, None);
        assert!(summary.osm_links.is_none());
        assert_eq!(summary.stops.len(), 1);
        assert_eq!(summary.stops[0].order, None);
    }

    #[test]
    fn summary_decodes_waymark() {
        let tags: Tags = [("osmc:symbol", "red:white:red_bar"), ("name", "GR 92")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let route = Route::from_relation(TravelMode::Walking, 1, "GR 92".into(), tags);

        let summary = RouteSummary::from_route(&route);

        assert_eq!(
            summary.osmc_description.as_deref(),
            Some("Color del camí: Vermell, Fons: Blanc, Símbol: red_bar")
        );
        assert_eq!(
            summary.osm_links.unwrap().view,
            "https://www.openstreetmap.org/relation/1"
        );
    }
}
