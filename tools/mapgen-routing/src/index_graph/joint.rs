use std::fmt;

use crate::feature::FeatureId;

pub type JointId = u32;

/// One vertex instance on one feature's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadPoint {
    pub feature_id: FeatureId,
    pub point_idx: u32,
}

impl RoadPoint {
    pub fn new(feature_id: FeatureId, point_idx: u32) -> Self {
        Self {
            feature_id,
            point_idx,
        }
    }
}

impl fmt::Display for RoadPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoadPoint({}, {})", self.feature_id, self.point_idx)
    }
}

/// Road points that coincide at one location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Joint {
    points: Vec<RoadPoint>,
}

impl Joint {
    pub fn new(points: Vec<RoadPoint>) -> Self {
        Self { points }
    }

    pub fn add_point(&mut self, rp: RoadPoint) {
        self.points.push(rp);
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[RoadPoint] {
        &self.points
    }

    /// Canonical form: points sorted, so joints compare independent of build order.
    pub fn normalized(mut self) -> Self {
        self.points.sort_unstable();
        self
    }
}
