//! Regional index graph
//!
//! Nodes of the search space are directed [`Segment`]s. Segments of one road
//! connect along the road; segments of different roads connect only through
//! [`Joint`]s, the locations where two or more roads share a point.

pub mod estimator;
pub mod joint;
pub mod road_geometry;
pub mod segment;

pub use estimator::EdgeEstimator;
pub use joint::{Joint, JointId, RoadPoint};
pub use road_geometry::{Geometry, RoadGeometry};
pub use segment::{Segment, SegmentEdge};

use rustc_hash::FxHashMap;

use crate::feature::FeatureId;

/// Travel time in deciseconds.
pub type Weight = u32;

/// Joint membership of the points of one road.
#[derive(Debug, Clone, Default)]
struct RoadJointIds {
    joint_ids: Vec<Option<JointId>>,
}

impl RoadJointIds {
    fn add_joint(&mut self, point_idx: u32, joint_id: JointId) {
        let idx = point_idx as usize;
        if idx >= self.joint_ids.len() {
            self.joint_ids.resize(idx + 1, None);
        }
        self.joint_ids[idx] = Some(joint_id);
    }

    fn joint_id(&self, point_idx: u32) -> Option<JointId> {
        self.joint_ids.get(point_idx as usize).copied().flatten()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexGraph {
    geometry: Geometry,
    estimator: EdgeEstimator,
    roads: FxHashMap<FeatureId, RoadJointIds>,
    joints: Vec<Joint>,
}

impl IndexGraph {
    pub fn new(geometry: Geometry, estimator: EdgeEstimator) -> Self {
        Self {
            geometry,
            estimator,
            roads: FxHashMap::default(),
            joints: Vec::new(),
        }
    }

    /// Replaces the joint index; joint ids are positions in `joints`.
    pub fn import(&mut self, joints: Vec<Joint>) {
        self.roads.clear();
        for (joint_id, joint) in joints.iter().enumerate() {
            for rp in joint.points() {
                self.roads
                    .entry(rp.feature_id)
                    .or_default()
                    .add_joint(rp.point_idx, joint_id as JointId);
            }
        }
        self.joints = joints;
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, joint_id: JointId) -> Option<&Joint> {
        self.joints.get(joint_id as usize)
    }

    pub fn joint_id(&self, rp: RoadPoint) -> Option<JointId> {
        self.roads.get(&rp.feature_id)?.joint_id(rp.point_idx)
    }

    /// Roads touching at least one joint.
    pub fn num_roads(&self) -> usize {
        self.roads.len()
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Road points over all joints.
    pub fn num_points(&self) -> usize {
        self.joints.iter().map(Joint::size).sum()
    }

    pub fn road(&self, feature_id: FeatureId) -> Option<&RoadGeometry> {
        self.geometry.road(feature_id)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn estimator(&self) -> &EdgeEstimator {
        &self.estimator
    }

    pub fn calc_segment_weight(&self, segment: &Segment) -> Weight {
        self.geometry
            .road(segment.feature_id)
            .map_or(0, |road| self.estimator.calc_segment_weight(segment, road))
    }

    /// Segments reachable from `segment` (outgoing) or leading into it (ingoing).
    ///
    /// Outgoing edges carry the weight of the target segment, ingoing edges the
    /// weight of `segment` itself. The immediate U-turn onto the reverse of
    /// `segment` is never emitted.
    pub fn edges(&self, segment: &Segment, is_outgoing: bool) -> Vec<SegmentEdge> {
        let mut edges = Vec::new();
        let rp = segment.road_point(is_outgoing);
        match self.joint_id(rp).and_then(|id| self.joint(id)) {
            Some(joint) => {
                for &other in joint.points() {
                    self.neighboring_edges(segment, other, is_outgoing, &mut edges);
                }
            }
            None => self.neighboring_edges(segment, rp, is_outgoing, &mut edges),
        }
        edges
    }

    fn neighboring_edges(
        &self,
        from: &Segment,
        rp: RoadPoint,
        is_outgoing: bool,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let Some(road) = self.geometry.road(rp.feature_id) else {
            return;
        };
        let bidirectional = !road.one_way;

        if (is_outgoing || bidirectional) && (rp.point_idx as usize) + 1 < road.points_count() {
            let to = Segment::new(rp.feature_id, rp.point_idx, is_outgoing);
            self.neighboring_edge(from, to, is_outgoing, edges);
        }
        if (!is_outgoing || bidirectional) && rp.point_idx > 0 {
            let to = Segment::new(rp.feature_id, rp.point_idx - 1, !is_outgoing);
            self.neighboring_edge(from, to, is_outgoing, edges);
        }
    }

    fn neighboring_edge(
        &self,
        from: &Segment,
        to: Segment,
        is_outgoing: bool,
        edges: &mut Vec<SegmentEdge>,
    ) {
        if to == from.reversed() {
            return;
        }
        let weight = self.calc_segment_weight(if is_outgoing { &to } else { from });
        edges.push(SegmentEdge::new(to, weight));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointD;

    fn road(points: &[(f64, f64)], one_way: bool) -> RoadGeometry {
        RoadGeometry::new(
            points.iter().map(|&(x, y)| PointD::new(x, y)).collect(),
            36.0,
            one_way,
        )
    }

    /// Two roads crossing at (1, 0):
    ///   road 0: (0,0) - (1,0) - (2,0), bidirectional
    ///   road 1: (1,-1) -> (1,0) -> (1,1), one-way
    fn crossing_graph() -> IndexGraph {
        let mut geometry = Geometry::default();
        geometry.insert(FeatureId(0), road(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], false));
        geometry.insert(FeatureId(1), road(&[(1.0, -1.0), (1.0, 0.0), (1.0, 1.0)], true));
        let mut graph = IndexGraph::new(geometry, EdgeEstimator::for_car(110.0));
        graph.import(vec![Joint::new(vec![
            RoadPoint::new(FeatureId(0), 1),
            RoadPoint::new(FeatureId(1), 1),
        ])]);
        graph
    }

    fn targets(edges: &[SegmentEdge]) -> Vec<Segment> {
        let mut t: Vec<Segment> = edges.iter().map(|e| e.target).collect();
        t.sort();
        t
    }

    #[test]
    fn test_counts() {
        let graph = crossing_graph();
        assert_eq!(graph.num_roads(), 2);
        assert_eq!(graph.num_joints(), 1);
        assert_eq!(graph.num_points(), 2);
        assert_eq!(graph.joint_id(RoadPoint::new(FeatureId(0), 1)), Some(0));
        assert_eq!(graph.joint_id(RoadPoint::new(FeatureId(0), 0)), None);
    }

    #[test]
    fn test_outgoing_through_joint() {
        let graph = crossing_graph();
        let from = Segment::new(FeatureId(0), 0, true);
        let edges = graph.edges(&from, true);
        assert_eq!(
            targets(&edges),
            vec![
                Segment::new(FeatureId(0), 1, true),
                Segment::new(FeatureId(1), 1, true),
            ]
        );
        for e in &edges {
            assert_eq!(e.weight, graph.calc_segment_weight(&e.target));
        }
    }

    #[test]
    fn test_one_way_road_is_not_entered_backwards() {
        let graph = crossing_graph();
        let from = Segment::new(FeatureId(0), 1, false);
        let edges = graph.edges(&from, true);
        assert!(!targets(&edges).contains(&Segment::new(FeatureId(1), 0, false)));
        assert!(targets(&edges).contains(&Segment::new(FeatureId(1), 1, true)));
    }

    #[test]
    fn test_ingoing_through_joint() {
        let graph = crossing_graph();
        let to = Segment::new(FeatureId(1), 1, true);
        let edges = graph.edges(&to, false);
        assert_eq!(
            targets(&edges),
            vec![
                Segment::new(FeatureId(0), 0, true),
                Segment::new(FeatureId(0), 1, false),
                Segment::new(FeatureId(1), 0, true),
            ]
        );
        for e in &edges {
            assert_eq!(e.weight, graph.calc_segment_weight(&to));
        }
    }

    #[test]
    fn test_no_u_turn_and_dead_end() {
        let graph = crossing_graph();
        let from = Segment::new(FeatureId(0), 1, true);
        assert!(graph.edges(&from, true).is_empty());
    }

    #[test]
    fn test_roads_without_geometry_have_no_edges() {
        let mut graph = IndexGraph::default();
        graph.import(vec![Joint::new(vec![
            RoadPoint::new(FeatureId(5), 0),
            RoadPoint::new(FeatureId(6), 0),
        ])]);
        assert!(graph.edges(&Segment::new(FeatureId(5), 0, true), true).is_empty());
    }
}
