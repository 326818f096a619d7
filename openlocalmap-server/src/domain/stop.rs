//! Public-transport stops.

use super::geometry::LatLon;
use super::route::Tags;

/// Name given to fallback-scan stops with no usable name tag.
pub const FALLBACK_STOP_NAME: &str = "Parada sense nom";

/// A stop along a public-transport route.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// OSM node id.
    pub osm_id: i64,
    pub name: String,
    pub position: LatLon,
    /// 1-based position along the route. Only set when the stop came from
    /// walking an ordered relation, never inferred from geography.
    pub order: Option<u32>,
    /// Relation membership role (`stop`, `platform`, ...).
    pub role: Option<String>,
    pub tags: Tags,
}

impl Stop {
    /// Placeholder name for an ordered stop without a name tag.
    pub fn placeholder_name(order: u32) -> String {
        format!("Parada {order}")
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }
}
