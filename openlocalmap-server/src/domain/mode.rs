//! Travel modes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// How a route is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Walking,
    Biking,
    PublicTransport,
}

impl TravelMode {
    /// All modes, in display order.
    pub const ALL: [TravelMode; 3] = [
        TravelMode::Walking,
        TravelMode::Biking,
        TravelMode::PublicTransport,
    ];

    /// Parse the snake_case name used in URLs and JSON.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "walking" => Ok(TravelMode::Walking),
            "biking" => Ok(TravelMode::Biking),
            "public_transport" => Ok(TravelMode::PublicTransport),
            other => Err(DomainError::UnknownMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Biking => "biking",
            TravelMode::PublicTransport => "public_transport",
        }
    }

    /// Name given to a named route whose tags resolve to nothing usable.
    pub fn default_route_name(&self) -> &'static str {
        match self {
            TravelMode::Walking => "Ruta a peu",
            TravelMode::Biking => "Ruta en bicicleta",
            TravelMode::PublicTransport => "Línia sense nom",
        }
    }

    /// Short type label shown next to a route.
    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::Walking => "Ruta a peu",
            TravelMode::Biking => "Ruta en bicicleta",
            TravelMode::PublicTransport => "Transport públic",
        }
    }

    /// Heading of the route-list section for this mode.
    pub fn section_title(&self) -> &'static str {
        match self {
            TravelMode::Walking => "Rutes a peu",
            TravelMode::Biking => "Rutes en bicicleta",
            TravelMode::PublicTransport => "Transport públic",
        }
    }

    /// Line colour when the route carries no `colour` tag.
    pub fn default_colour(&self) -> &'static str {
        match self {
            TravelMode::Walking => "#FF6B35",
            TravelMode::Biking => "#4ECDC4",
            TravelMode::PublicTransport => "#45B7D1",
        }
    }

    /// Id and name of the placeholder route emitted when only untagged paths
    /// exist. Public transport has none.
    pub fn synthetic_route(&self) -> Option<(&'static str, &'static str)> {
        match self {
            TravelMode::Walking => Some(("walking_paths_synthetic", "Camins i senders locals")),
            TravelMode::Biking => Some(("cycling_paths_synthetic", "Carrils bici locals")),
            TravelMode::PublicTransport => None,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
