use crate::core::constants::MAX_FIT_ZOOM;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Latitude cutoff of the Web Mercator projection
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a LatLng from the `[lng, lat]` array order used by the
    /// overlay config format
    pub fn from_lng_lat(lng: f64, lat: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns the coordinate in `[lng, lat]` array order
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Clamps latitude to the Web Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Projects into zoom-0 tile space: x and y each cover [0, 1) across
    /// the whole world, with y growing towards the south pole.
    pub fn to_tile_space(&self) -> Point {
        let lat_rad = Self::clamp_lat(self.lat).to_radians();
        let x = (self.lng + 180.0) / 360.0;
        let y = (1.0 - ((PI / 4.0 + lat_rad / 2.0).tan().ln()) / PI) / 2.0;
        Point::new(x, y)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in projected tile-space coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// Scales a zoom-0 point to the tile grid of zoom `z`
    pub fn zoom_to(&self, z: u8) -> Point {
        self.multiply(f64::powi(2.0, z as i32))
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = 2_u32.pow(self.z as u32);
        self.x < max_coord && self.y < max_coord
    }
}

/// Picks a tile-space coordinate and a zoom level such that all four
/// supplied zoom-0 points fit within one tile length of each other at that
/// zoom.
///
/// The heuristic takes the bounding box of the points, chooses the deepest
/// zoom at which the larger box span still fits in a single tile, and
/// returns the box midpoint scaled to that zoom. Callers must treat the
/// fitting strategy as opaque and rely only on the containment contract.
pub fn best_fit_center(points: &[Point; 4]) -> (Point, u8) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let span = (max_x - min_x).max(max_y - min_y);
    let zoom = if span > 0.0 {
        (-span.log2()).floor().clamp(0.0, MAX_FIT_ZOOM as f64) as u8
    } else {
        MAX_FIT_ZOOM
    };

    let center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0).zoom_to(zoom);
    (center, zoom)
}
