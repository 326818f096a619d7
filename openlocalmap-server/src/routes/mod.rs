//! Route discovery pipeline.
//!
//! Given a bounding area, finds walking, biking and public-transport routes
//! through Overpass, with a synthetic-route fallback for untagged paths and
//! a single expanded-area retry when nothing at all is found. Stops and
//! geometry for a selected route are fetched on demand.

mod classify;
mod config;
mod geometry;
mod queries;
mod search;
mod stops;

pub use classify::Classifier;
pub use config::SearchConfig;
pub use geometry::GeometryResolver;
pub use queries::{
    TagGroup, expanded_groups, expanded_query, member_ways_query, mode_groups, mode_query,
    nearby_ways_query, relation_walk_query, stop_chain_query, synthetic_groups, synthetic_query,
    way_query,
};
pub use search::{ModeFailure, RouteSearch, SearchOutcome, SearchStage};
pub use stops::{STOP_NODE_TAGS, STOP_ROLES, StopSequencer, fallback_stops, ordered_stops};
