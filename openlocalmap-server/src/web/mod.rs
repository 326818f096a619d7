//! Web layer for route discovery.
//!
//! Exposes area search, stops and geometry lookups over HTTP/JSON, plus an
//! HTML fragment of the route list.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
