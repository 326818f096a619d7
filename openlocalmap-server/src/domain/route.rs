//! The normalised route model.

use std::collections::BTreeMap;

use serde::Serialize;

use super::bounds::BoundingArea;
use super::mode::TravelMode;
use super::name::non_empty;
use super::osmc::OsmcSymbol;
use super::stop::Stop;

/// OSM tag mapping. Ordered so that derived output is deterministic.
pub type Tags = BTreeMap<String, String>;

/// Id of the last-resort bus bucket built from loose stops.
pub const GENERATED_TRANSIT_ID: &str = "generated_bus_route";

/// Display name of the last-resort bus bucket.
pub const GENERATED_TRANSIT_NAME: &str = "Línies d'autobús locals";

/// Where a route came from in OpenStreetMap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OsmRef {
    /// A route relation.
    Relation(i64),
    /// A single way.
    Way(i64),
    /// Placeholder for untagged paths found in the given area.
    Synthetic(BoundingArea),
    /// Bucket of loose public-transport stops.
    Generated,
}

impl OsmRef {
    /// `relation`, `way`, `synthetic` or `generated`.
    pub fn osm_type(&self) -> &'static str {
        match self {
            OsmRef::Relation(_) => "relation",
            OsmRef::Way(_) => "way",
            OsmRef::Synthetic(_) => "synthetic",
            OsmRef::Generated => "generated",
        }
    }

    /// The OSM element id, for relations and ways.
    pub fn osm_id(&self) -> Option<i64> {
        match self {
            OsmRef::Relation(id) | OsmRef::Way(id) => Some(*id),
            OsmRef::Synthetic(_) | OsmRef::Generated => None,
        }
    }
}

/// A route shown to the user.
///
/// Routes are rebuilt wholesale on every area search and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// `relation_<id>`, `way_<id>` or one of the fixed placeholder ids.
    pub id: String,
    pub mode: TravelMode,
    pub name: String,
    pub osm: OsmRef,
    /// Raw tags, empty for synthetic and generated routes.
    pub tags: Tags,
    /// Stops, populated lazily for public transport.
    pub stops: Vec<Stop>,
}

impl Route {
    /// Route backed by an OSM relation.
    pub fn from_relation(mode: TravelMode, osm_id: i64, name: String, tags: Tags) -> Self {
        Self {
            id: format!("relation_{osm_id}"),
            mode,
            name,
            osm: OsmRef::Relation(osm_id),
            tags,
            stops: Vec::new(),
        }
    }

    /// Route backed by a single OSM way.
    pub fn from_way(mode: TravelMode, osm_id: i64, name: String, tags: Tags) -> Self {
        Self {
            id: format!("way_{osm_id}"),
            mode,
            name,
            osm: OsmRef::Way(osm_id),
            tags,
            stops: Vec::new(),
        }
    }

    /// Placeholder standing for the untagged paths of `mode` inside `area`.
    ///
    /// Returns `None` for public transport, which has no such placeholder.
    pub fn synthetic(mode: TravelMode, area: BoundingArea) -> Option<Self> {
        let (id, name) = mode.synthetic_route()?;
        Some(Self {
            id: id.to_string(),
            mode,
            name: name.to_string(),
            osm: OsmRef::Synthetic(area),
            tags: Tags::new(),
            stops: Vec::new(),
        })
    }

    /// Bucket holding loose public-transport stops found in an area.
    pub fn generated_transit(stops: Vec<Stop>) -> Self {
        Self {
            id: GENERATED_TRANSIT_ID.to_string(),
            mode: TravelMode::PublicTransport,
            name: GENERATED_TRANSIT_NAME.to_string(),
            osm: OsmRef::Generated,
            tags: Tags::new(),
            stops,
        }
    }

    /// The relation id, if this route is a relation.
    pub fn relation_id(&self) -> Option<i64> {
        match self.osm {
            OsmRef::Relation(id) => Some(id),
            _ => None,
        }
    }

    /// Non-empty tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        non_empty(&self.tags, key)
    }

    /// Line colour: `colour`, then `color`, then the mode default.
    ///
    /// Tag values other than `#rgb`, `#rrggbb` or a bare colour name are
    /// skipped.
    pub fn colour(&self) -> &str {
        self.tag("colour")
            .filter(|c| is_css_colour(c))
            .or_else(|| self.tag("color").filter(|c| is_css_colour(c)))
            .unwrap_or_else(|| self.mode.default_colour())
    }

    /// Descriptive fields shown in the route detail panel.
    pub fn details(&self) -> RouteDetails {
        let get = |key: &str| self.tag(key).map(str::to_string);
        RouteDetails {
            description: get("description"),
            distance: get("distance"),
            elevation: get("ele"),
            difficulty: get("difficulty"),
            duration: get("duration"),
            interval: get("interval"),
            from: get("from"),
            to: get("to"),
            route_kind: get("route"),
            reference: get("ref"),
        }
    }

    /// OpenStreetMap view and edit links. Only relations have them.
    pub fn osm_links(&self) -> Option<OsmLinks> {
        let id = self.relation_id()?;
        Some(OsmLinks {
            view: format!("https://www.openstreetmap.org/relation/{id}"),
            edit: format!("https://www.openstreetmap.org/edit?editor=id&relation={id}"),
        })
    }

    /// Decoded `osmc:symbol` waymark, if tagged and well formed.
    pub fn osmc_symbol(&self) -> Option<OsmcSymbol> {
        self.tag("osmc:symbol").and_then(OsmcSymbol::parse)
    }
}

fn is_css_colour(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

/// Descriptive tag values of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteDetails {
    pub description: Option<String>,
    pub distance: Option<String>,
    pub elevation: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<String>,
    /// Service interval (public transport).
    pub interval: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Value of the `route` tag (`bus`, `hiking`, ...).
    pub route_kind: Option<String>,
    pub reference: Option<String>,
}

/// Links to a route relation on openstreetmap.org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsmLinks {
    pub view: String,
    pub edit: String,
}
