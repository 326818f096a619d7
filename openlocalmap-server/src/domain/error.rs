//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from Overpass/IO errors.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Bounding area is inverted, out of range or not finite
    #[error("invalid bounding area: {0}")]
    InvalidBounds(&'static str),

    /// Travel mode name not recognised
    #[error("unknown travel mode: {0}")]
    UnknownMode(String),
}
