use std::cmp::Ordering;
use std::fmt;

use crate::geometry::{almost_equal_abs, PointD};

/// Altitude in meters.
pub type Altitude = i16;

pub const DEFAULT_ALTITUDE_METERS: Altitude = 0;

/// Graph node: a point plus its altitude.
///
/// Equality and ordering look at the point only; the altitude is payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct Junction {
    point: PointD,
    altitude: Altitude,
}

impl Junction {
    pub fn new(point: PointD, altitude: Altitude) -> Self {
        Self { point, altitude }
    }

    pub fn point(&self) -> PointD {
        self.point
    }

    pub fn altitude(&self) -> Altitude {
        self.altitude
    }

    /// Points differ by less than `eps` on both axes.
    pub fn almost_equal(&self, other: &Junction, eps: f64) -> bool {
        almost_equal_abs(self.point, other.point, eps)
    }
}

pub fn make_junction_for_testing(point: PointD) -> Junction {
    Junction::new(point, DEFAULT_ALTITUDE_METERS)
}

impl PartialEq for Junction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Junction {}

impl PartialOrd for Junction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Junction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.point
            .x
            .total_cmp(&other.point.x)
            .then_with(|| self.point.y.total_cmp(&other.point.y))
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Junction{} @{}m", self.point, self.altitude)
    }
}
