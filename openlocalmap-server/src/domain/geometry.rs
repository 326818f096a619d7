//! Drawable route geometry.

use serde::{Deserialize, Serialize};

/// Fewest points a polyline needs to be drawn.
pub const MIN_POLYLINE_POINTS: usize = 2;

/// A WGS84 coordinate, taken verbatim from Overpass (no reprojection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Ordered points of one line, in the source way's or relation walk's order.
pub type Polyline = Vec<LatLon>;

/// The polylines that make up a route on the map.
///
/// Zero polylines means no geometry is available, which is a valid outcome
/// rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteGeometry {
    polylines: Vec<Polyline>,
}

impl RouteGeometry {
    /// Geometry with no polylines.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build geometry from polylines, dropping any that are too short to draw.
    pub fn new(polylines: impl IntoIterator<Item = Polyline>) -> Self {
        let mut geometry = Self::empty();
        for polyline in polylines {
            geometry.push(polyline);
        }
        geometry
    }

    /// Append a polyline if it has at least [`MIN_POLYLINE_POINTS`] points.
    ///
    /// Returns whether it was kept.
    pub fn push(&mut self, polyline: Polyline) -> bool {
        if polyline.len() < MIN_POLYLINE_POINTS {
            return false;
        }
        self.polylines.push(polyline);
        true
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn into_polylines(self) -> Vec<Polyline> {
        self.polylines
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Number of polylines.
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    /// Total number of points across all polylines.
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Vec::len).sum()
    }

    /// All points, polyline by polyline.
    pub fn points(&self) -> impl Iterator<Item = LatLon> + '_ {
        self.polylines.iter().flatten().copied()
    }
}

/// Arithmetic mean of `points`, or `None` when there are none.
pub(crate) fn centroid(points: impl IntoIterator<Item = LatLon>) -> Option<LatLon> {
    let (mut lat, mut lon, mut count) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat;
        lon += p.lon;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(LatLon::new(lat / count as f64, lon / count as f64))
}
