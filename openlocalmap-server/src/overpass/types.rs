//! Overpass JSON response types.
//!
//! Elements are modelled as a sum type keyed on the `type` field so that the
//! rest of the crate pattern-matches on the variant instead of probing for
//! optional fields.

use serde::Deserialize;

use crate::domain::{LatLon, Tags};

/// Top-level Overpass JSON response.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<OverpassElement>,
}

/// One element of an Overpass response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverpassElement {
    Node(Node),
    Way(Way),
    Relation(Relation),
    /// Element types nothing here consumes (`area`, `count`, ...).
    #[serde(other)]
    Unknown,
}

impl OverpassElement {
    pub fn id(&self) -> Option<i64> {
        match self {
            OverpassElement::Node(n) => Some(n.id),
            OverpassElement::Way(w) => Some(w.id),
            OverpassElement::Relation(r) => Some(r.id),
            OverpassElement::Unknown => None,
        }
    }

    pub fn tags(&self) -> Option<&Tags> {
        match self {
            OverpassElement::Node(n) => Some(&n.tags),
            OverpassElement::Way(w) => Some(&w.tags),
            OverpassElement::Relation(r) => Some(&r.tags),
            OverpassElement::Unknown => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            OverpassElement::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_way(&self) -> Option<&Way> {
        match self {
            OverpassElement::Way(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            OverpassElement::Relation(r) => Some(r),
            _ => None,
        }
    }
}

/// An OSM node. Coordinates are absent for `out tags;` output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Tags,
}

impl Node {
    pub fn position(&self) -> Option<LatLon> {
        Some(LatLon::new(self.lat?, self.lon?))
    }
}

/// An OSM way.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Way {
    pub id: i64,
    /// Node ids in way order. Absent for `out tags;` output.
    #[serde(default)]
    pub nodes: Vec<i64>,
    /// Inline coordinates from `out geom;`, in way order.
    #[serde(default)]
    pub geometry: Option<Vec<LatLon>>,
    /// Way centre from `out center;`.
    #[serde(default)]
    pub center: Option<LatLon>,
    #[serde(default)]
    pub tags: Tags,
}

/// An OSM relation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relation {
    pub id: i64,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tags: Tags,
}

/// A relation member reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    #[serde(rename = "ref")]
    pub ref_id: i64,
    #[serde(default)]
    pub role: String,
}

/// Type of the element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Node,
    Way,
    Relation,
    #[serde(other)]
    Other,
}
