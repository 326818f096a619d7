//! Bounding areas.

use std::fmt;

use serde::Serialize;

use super::error::DomainError;
use super::geometry::LatLon;

/// A south/west/north/east rectangle in WGS84 degrees.
///
/// Every `BoundingArea` satisfies `south < north` and `west < east`, with
/// all four values finite and inside the valid latitude/longitude ranges.
///
/// # Examples
///
/// ```
/// use openlocalmap_server::domain::BoundingArea;
///
/// let area = BoundingArea::new(41.2, 1.7, 41.25, 1.75).unwrap();
/// assert_eq!(area.to_overpass_bbox(), "41.2,1.7,41.25,1.75");
///
/// // Swapped latitudes are rejected
/// assert!(BoundingArea::new(41.25, 1.7, 41.2, 1.75).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingArea {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl BoundingArea {
    /// Vilanova i la Geltrú, used when no location has been selected.
    pub const VILANOVA: BoundingArea = BoundingArea {
        south: 41.2,
        west: 1.7,
        north: 41.25,
        east: 1.75,
    };

    /// Create a bounding area, validating its invariants.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, DomainError> {
        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(DomainError::InvalidBounds("coordinates must be finite"));
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(DomainError::InvalidBounds("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(DomainError::InvalidBounds("longitude out of range"));
        }
        if south >= north {
            return Err(DomainError::InvalidBounds("south must be below north"));
        }
        if west >= east {
            return Err(DomainError::InvalidBounds("west must be left of east"));
        }

        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    /// North-south extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// West-east extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Grow the area by `factor` of its height on the south and north sides
    /// and `factor` of its width on the west and east sides.
    ///
    /// The result is clamped to the valid coordinate ranges. Negative
    /// factors are treated as zero.
    pub fn expanded(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let dy = self.height() * factor;
        let dx = self.width() * factor;

        Self {
            south: (self.south - dy).max(-90.0),
            west: (self.west - dx).max(-180.0),
            north: (self.north + dy).min(90.0),
            east: (self.east + dx).min(180.0),
        }
    }

    /// Whether `point` lies inside the area (edges included).
    pub fn contains(&self, point: LatLon) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lon)
    }

    /// Overpass QL bbox clause body: `south,west,north,east`.
    pub fn to_overpass_bbox(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl Default for BoundingArea {
    fn default() -> Self {
        Self::VILANOVA
    }
}

impl fmt::Display for BoundingArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_overpass_bbox())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for valid areas away from the poles and antimeridian.
    fn arb_area() -> impl Strategy<Value = BoundingArea> {
        (-80.0f64..80.0, -170.0f64..170.0, 0.0001f64..5.0, 0.0001f64..5.0).prop_map(
            |(south, west, h, w)| BoundingArea::new(south, west, south + h, west + w).unwrap(),
        )
    }

    proptest! {
        /// The bbox string always renders south,west,north,east
        #[test]
        fn bbox_renders_in_order(area in arb_area()) {
            let bbox = area.to_overpass_bbox();
            let parts: Vec<f64> = bbox.split(',').map(|p| p.parse().unwrap()).collect();
            prop_assert_eq!(parts.len(), 4);
            prop_assert_eq!(parts[0], area.south());
            prop_assert_eq!(parts[1], area.west());
            prop_assert_eq!(parts[2], area.north());
            prop_assert_eq!(parts[3], area.east());
            prop_assert!(parts[0] < parts[2]);
            prop_assert!(parts[1] < parts[3]);
        }

        /// Expansion is strictly larger on all four sides
        #[test]
        fn expansion_strictly_larger(area in arb_area()) {
            let big = area.expanded(0.5);
            prop_assert!(big.south() < area.south());
            prop_assert!(big.west() < area.west());
            prop_assert!(big.north() > area.north());
            prop_assert!(big.east() > area.east());
        }
    }
}
