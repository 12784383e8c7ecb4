//! Geodesy helpers: great-circle distance, Web-Mercator projection and
//! grid quantization
//!
//! All coordinates are (lon, lat) in WGS84 degrees unless noted otherwise.

use geo::HaversineDistance;
use geo::Point;

/// Spherical Mercator earth radius in meters
const EARTH_RADIUS: f64 = 6378137.0;

/// Great-circle distance between two (lon, lat) coordinates, in meters
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let p1 = Point::new(a.0, a.1);
    let p2 = Point::new(b.0, b.1);
    p1.haversine_distance(&p2)
}

/// Convert WGS84 (lon, lat) to Web Mercator meters
pub fn to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = ((std::f64::consts::PI / 4.0) + (lat.to_radians() / 2.0))
        .tan()
        .ln()
        * EARTH_RADIUS;
    (x, y)
}

/// Convert Web Mercator meters back to WGS84 (lon, lat)
pub fn from_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::PI / 2.0).to_degrees();
    (lon, lat)
}

/// Linear interpolation between two (lon, lat) coordinates
///
/// Not geodesically exact; acceptable at the few-hundred-meter step sizes
/// this pipeline works at.
pub fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// A quantization bucket on the Web-Mercator grid
///
/// The coordinate-to-cell mapping is many-to-one; the cell centroid is the
/// fixed representative point, so round-tripping a coordinate through its
/// cell is lossy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub cx: i64,
    pub cy: i64,
}

impl GridCell {
    /// Quantize a (lon, lat) coordinate onto the grid at `grid_m` resolution
    pub fn of(coord: (f64, f64), grid_m: f64) -> Self {
        let (x, y) = to_mercator(coord.0, coord.1);
        GridCell {
            cx: (x / grid_m).floor() as i64,
            cy: (y / grid_m).floor() as i64,
        }
    }

    /// Cell centroid back-projected to (lon, lat)
    pub fn centroid(&self, grid_m: f64) -> (f64, f64) {
        let x = (self.cx as f64 + 0.5) * grid_m;
        let y = (self.cy as f64 + 0.5) * grid_m;
        from_mercator(x, y)
    }
}

/// Canonical key for an undirected cell pair
///
/// The smaller cell comes first, so edges folded as A→B and B→A coalesce
/// into one map entry.
pub fn edge_key(a: GridCell, b: GridCell) -> (GridCell, GridCell) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_roundtrip() {
        let lon = 11.575;
        let lat = 48.137;
        let (x, y) = to_mercator(lon, lat);
        let (lon2, lat2) = from_mercator(x, y);
        assert!((lat - lat2).abs() < 0.0001);
        assert!((lon - lon2).abs() < 0.0001);
    }

    #[test]
    fn test_haversine_munich_east() {
        // One-tenth degree of longitude at 48°N is roughly 7.4 km
        let d = haversine_m((11.575, 48.137), (11.675, 48.137));
        assert!(d > 7000.0 && d < 7800.0, "unexpected distance: {d}");
    }

    #[test]
    fn test_haversine_zero() {
        assert!(haversine_m((11.575, 48.137), (11.575, 48.137)) < 1e-9);
    }

    #[test]
    fn test_grid_cell_roundtrip_is_lossy() {
        let coord = (11.575, 48.137);
        let cell = GridCell::of(coord, 800.0);
        let center = cell.centroid(800.0);
        // Centroid lands in the same cell, but not on the original coordinate
        assert_eq!(GridCell::of(center, 800.0), cell);
        assert!(haversine_m(coord, center) < 800.0);
    }

    #[test]
    fn test_nearby_points_share_cell() {
        let a = GridCell::of((11.5750, 48.1370), 800.0);
        let b = GridCell::of((11.5751, 48.1371), 800.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_edge_key_symmetric() {
        let a = GridCell { cx: 3, cy: -2 };
        let b = GridCell { cx: -1, cy: 7 };
        assert_eq!(edge_key(a, b), edge_key(b, a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = (11.0, 48.0);
        let b = (12.0, 49.0);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp(a, b, 0.5), (11.5, 48.5));
    }
}
