use std::fmt;

use super::junction::Junction;
use crate::feature::FeatureId;

/// Directed link between two junctions.
///
/// Real edges belong to segment `seg_id` of a feature. Fake edges have no
/// feature; they splice points that are not road vertices into the graph.
/// A fake edge that covers part of a real edge is flagged `part_of_real`.
///
/// Field order defines the derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    feature_id: Option<FeatureId>,
    forward: bool,
    part_of_real: bool,
    seg_id: u32,
    start: Junction,
    end: Junction,
}

impl Edge {
    pub fn new(feature_id: FeatureId, forward: bool, seg_id: u32, start: Junction, end: Junction) -> Self {
        Self {
            feature_id: Some(feature_id),
            forward,
            part_of_real: false,
            seg_id,
            start,
            end,
        }
    }

    pub fn make_fake(start: Junction, end: Junction, part_of_real: bool) -> Self {
        Self {
            feature_id: None,
            forward: true,
            part_of_real,
            seg_id: 0,
            start,
            end,
        }
    }

    pub fn feature_id(&self) -> Option<FeatureId> {
        self.feature_id
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn seg_id(&self) -> u32 {
        self.seg_id
    }

    pub fn start(&self) -> &Junction {
        &self.start
    }

    pub fn end(&self) -> &Junction {
        &self.end
    }

    pub fn is_fake(&self) -> bool {
        self.feature_id.is_none()
    }

    pub fn is_part_of_real(&self) -> bool {
        self.part_of_real
    }

    pub fn reverse(&self) -> Edge {
        Edge {
            forward: !self.forward,
            start: self.end,
            end: self.start,
            ..*self
        }
    }

    pub fn same_road_segment_and_direction(&self, other: &Edge) -> bool {
        self.feature_id == other.feature_id
            && self.forward == other.forward
            && self.seg_id == other.seg_id
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.feature_id {
            Some(id) => write!(f, "Edge(feature {id}, seg {}", self.seg_id)?,
            None if self.part_of_real => f.write_str("Edge(fake, part of real")?,
            None => f.write_str("Edge(fake")?,
        }
        write!(
            f,
            ", {}, {} -> {})",
            if self.forward { "fwd" } else { "bwd" },
            self.start.point(),
            self.end.point()
        )
    }
}
