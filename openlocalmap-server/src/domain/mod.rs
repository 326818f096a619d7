//! Domain types for route discovery.
//!
//! These types describe what the rest of the crate works with once raw
//! Overpass data has been normalised: bounding areas, travel modes, routes,
//! stops and drawable geometry. Validating constructors enforce invariants so
//! that code receiving these values can trust them.

mod bounds;
mod error;
mod geometry;
mod mode;
mod name;
mod osmc;
mod route;
mod stop;

pub use bounds::BoundingArea;
pub use error::DomainError;
pub use geometry::{LatLon, MIN_POLYLINE_POINTS, Polyline, RouteGeometry};
pub(crate) use geometry::centroid;
pub use mode::TravelMode;
pub use name::NamePreferences;
pub use osmc::{OsmcColour, OsmcSymbol};
pub use route::{
    GENERATED_TRANSIT_ID, GENERATED_TRANSIT_NAME, OsmLinks, OsmRef, Route, RouteDetails, Tags,
};
pub use stop::{FALLBACK_STOP_NAME, Stop};
