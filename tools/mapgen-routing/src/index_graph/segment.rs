use std::fmt;

use super::joint::RoadPoint;
use super::Weight;
use crate::feature::FeatureId;

/// Directed unit of travel between points `segment_idx` and `segment_idx + 1`
/// of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    pub feature_id: FeatureId,
    pub segment_idx: u32,
    pub forward: bool,
}

impl Segment {
    pub fn new(feature_id: FeatureId, segment_idx: u32, forward: bool) -> Self {
        Self {
            feature_id,
            segment_idx,
            forward,
        }
    }

    /// Index of the segment's end point (`front`) or start point.
    pub fn point_idx(&self, front: bool) -> u32 {
        if self.forward == front {
            self.segment_idx + 1
        } else {
            self.segment_idx
        }
    }

    pub fn road_point(&self, front: bool) -> RoadPoint {
        RoadPoint::new(self.feature_id, self.point_idx(front))
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.feature_id, self.segment_idx, !self.forward)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment({}, {}, {})",
            self.feature_id,
            self.segment_idx,
            if self.forward { "fwd" } else { "bwd" }
        )
    }
}

/// Transition to `target` costing `weight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentEdge {
    pub target: Segment,
    pub weight: Weight,
}

impl SegmentEdge {
    pub fn new(target: Segment, weight: Weight) -> Self {
        Self { target, weight }
    }
}
