//! OpenLocalMap route discovery server.
//!
//! Finds walking, cycling and public-transport routes inside a map area by
//! querying OpenStreetMap through the Overpass API, then resolves the stops
//! and drawable geometry of whichever route the user picks.

pub mod cache;
pub mod domain;
pub mod overpass;
pub mod render;
pub mod routes;
pub mod session;
pub mod web;
