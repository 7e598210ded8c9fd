//! Planar points, fixed-point quantization and distance helpers
//!
//! Coordinates are stored as `x` = longitude, `y` = latitude in degrees. Both
//! axes share the `[-180, 180]` range so a single quantization grid covers them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default quantization precision (bits per axis) for new regions.
pub const POINT_COORD_BITS: u8 = 30;

/// Tolerance for "same location" comparisons of reconstructed coordinates.
pub const POINTS_EQUAL_EPSILON: f64 = 1e-6;

const COORD_MIN: f64 = -180.0;
const COORD_MAX: f64 = 180.0;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for PointD {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<PointD> for [f64; 2] {
    fn from(p: PointD) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for PointD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.x, self.y)
    }
}

/// Point on the fixed-point grid of a given precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PointU {
    pub x: u32,
    pub y: u32,
}

impl PointU {
    pub fn from_point(p: PointD, coord_bits: u8) -> Self {
        Self {
            x: quantize_coord(p.x, coord_bits),
            y: quantize_coord(p.y, coord_bits),
        }
    }

    pub fn to_point(self, coord_bits: u8) -> PointD {
        PointD::new(
            dequantize_coord(self.x, coord_bits),
            dequantize_coord(self.y, coord_bits),
        )
    }
}

/// Canonical location key: two points share a key iff they land on the same
/// grid cell at the given precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(u64);

impl PointKey {
    pub fn new(p: PointD, coord_bits: u8) -> Self {
        let pu = PointU::from_point(p, coord_bits);
        Self((u64::from(pu.x) << 32) | u64::from(pu.y))
    }
}

fn grid_max(coord_bits: u8) -> f64 {
    debug_assert!((1..=32).contains(&coord_bits));
    ((1u64 << coord_bits) - 1) as f64
}

pub fn quantize_coord(value: f64, coord_bits: u8) -> u32 {
    let clamped = value.clamp(COORD_MIN, COORD_MAX);
    let scaled = (clamped - COORD_MIN) / (COORD_MAX - COORD_MIN) * grid_max(coord_bits);
    scaled.round() as u32
}

pub fn dequantize_coord(value: u32, coord_bits: u8) -> f64 {
    f64::from(value) / grid_max(coord_bits) * (COORD_MAX - COORD_MIN) + COORD_MIN
}

/// Both coordinates differ by less than `eps`.
pub fn almost_equal_abs(a: PointD, b: PointD, eps: f64) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

/// Great-circle distance in meters.
pub fn haversine_distance(a: PointD, b: PointD) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let delta_lat = (b.y - a.y).to_radians();
    let delta_lon = (b.x - a.x).to_radians();

    let h =
        (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Closest point to `p` on segment `ab` (planar).
pub fn project_on_segment(p: PointD, a: PointD, b: PointD) -> PointD {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    PointD::new(a.x + t * dx, a.y + t * dy)
}

/// `p` lies on segment `ab` within [`POINTS_EQUAL_EPSILON`].
pub fn is_point_on_segment(p: PointD, a: PointD, b: PointD) -> bool {
    almost_equal_abs(project_on_segment(p, a, b), p, POINTS_EQUAL_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_round_trip_within_grid_step() {
        let p = PointD::new(4.3517103, 50.8503396);
        let back = PointU::from_point(p, POINT_COORD_BITS).to_point(POINT_COORD_BITS);
        let step = 360.0 / grid_max(POINT_COORD_BITS);
        assert!((back.x - p.x).abs() <= step);
        assert!((back.y - p.y).abs() <= step);
    }

    #[test]
    fn test_point_key_merges_float_noise() {
        let a = PointD::new(10.0, 20.0);
        let b = PointD::new(10.0 + 1e-12, 20.0 - 1e-12);
        assert_eq!(PointKey::new(a, POINT_COORD_BITS), PointKey::new(b, POINT_COORD_BITS));

        let c = PointD::new(10.001, 20.0);
        assert_ne!(PointKey::new(a, POINT_COORD_BITS), PointKey::new(c, POINT_COORD_BITS));
    }

    #[test]
    fn test_coarse_precision_merges_nearby_points() {
        let a = PointD::new(10.0, 20.0);
        let b = PointD::new(10.01, 20.01);
        assert_eq!(PointKey::new(a, 8), PointKey::new(b, 8));
    }

    #[test]
    fn test_quantize_clamps_out_of_range() {
        assert_eq!(quantize_coord(-500.0, 16), 0);
        assert_eq!(quantize_coord(500.0, 16), u32::from(u16::MAX));
    }

    #[test]
    fn test_almost_equal_abs_uses_tolerance() {
        let a = PointD::new(1.0, 1.0);
        assert!(almost_equal_abs(a, PointD::new(1.0 + 5e-7, 1.0), POINTS_EQUAL_EPSILON));
        assert!(!almost_equal_abs(a, PointD::new(1.0 + 5e-6, 1.0), POINTS_EQUAL_EPSILON));
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance(PointD::new(0.0, 0.0), PointD::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_point_on_segment() {
        let a = PointD::new(0.0, 0.0);
        let b = PointD::new(2.0, 0.0);
        assert!(is_point_on_segment(PointD::new(1.0, 0.0), a, b));
        assert!(!is_point_on_segment(PointD::new(1.0, 0.5), a, b));
        assert!(!is_point_on_segment(PointD::new(3.0, 0.0), a, b));
    }
}
