//! Query-time road graph
//!
//! Nodes are [`Junction`]s and arcs are [`Edge`]s. Regular edges are derived
//! on demand from the [`RoadInfo`] of roads near a junction. Fake edges are a
//! per-session overlay added with [`RoadGraph::add_fake_edges`] and dropped
//! with [`RoadGraph::reset_fakes`].

pub mod edge;
pub mod junction;
pub mod memory;

pub use edge::Edge;
pub use junction::{make_junction_for_testing, Altitude, Junction, DEFAULT_ALTITUDE_METERS};
pub use memory::MemoryRoadSource;

use std::collections::BTreeMap;
use std::fmt;

use crate::feature::FeatureId;
use crate::geometry::{is_point_on_segment, PointD, POINTS_EQUAL_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ObeyOnewayTag,
    IgnoreOnewayTag,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::ObeyOnewayTag => "ObeyOnewayTag",
            Mode::IgnoreOnewayTag => "IgnoreOnewayTag",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Outgoing,
    Ingoing,
}

/// Routing-relevant part of one road.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadInfo {
    pub junctions: Vec<Junction>,
    pub speed_kmph: f64,
    pub bidirectional: bool,
}

impl RoadInfo {
    pub fn new(bidirectional: bool, speed_kmph: f64, junctions: Vec<Junction>) -> Self {
        Self {
            junctions,
            speed_kmph,
            bidirectional,
        }
    }
}

/// Persisted road data the graph is layered over.
pub trait RoadSource {
    fn road_info(&self, feature_id: FeatureId) -> Option<RoadInfo>;

    fn speed_kmph(&self, feature_id: FeatureId) -> f64;

    fn max_speed_kmph(&self) -> f64;

    /// Calls `f` once for each road with a vertex near `cross`.
    fn for_each_feature_closest_to_cross(&self, cross: PointD, f: &mut dyn FnMut(FeatureId, &RoadInfo));

    /// Up to `count` nearest real edges with the projection of `point` on each.
    fn find_closest_edges(&self, point: PointD, count: usize) -> Vec<(Edge, Junction)>;

    fn mode(&self) -> Mode;
}

pub struct RoadGraph<S: RoadSource> {
    source: S,
    fake_outgoing: BTreeMap<Junction, Vec<Edge>>,
    fake_ingoing: BTreeMap<Junction, Vec<Edge>>,
}

impl<S: RoadSource> RoadGraph<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            fake_outgoing: BTreeMap::new(),
            fake_ingoing: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn mode(&self) -> Mode {
        self.source.mode()
    }

    pub fn outgoing_edges(&self, junction: &Junction) -> Vec<Edge> {
        self.edges(junction, EdgeDirection::Outgoing)
    }

    pub fn ingoing_edges(&self, junction: &Junction) -> Vec<Edge> {
        self.edges(junction, EdgeDirection::Ingoing)
    }

    /// Regular edges followed by fake edges.
    pub fn edges(&self, junction: &Junction, direction: EdgeDirection) -> Vec<Edge> {
        let mut edges = self.regular_edges(junction, direction);
        edges.extend(self.fake_edges(junction, direction));
        edges
    }

    pub fn regular_edges(&self, junction: &Junction, direction: EdgeDirection) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mode = self.source.mode();
        self.source
            .for_each_feature_closest_to_cross(junction.point(), &mut |feature_id, road| {
                load_cross_edges(*junction, mode, direction, feature_id, road, &mut edges);
            });
        edges
    }

    pub fn fake_edges(&self, junction: &Junction, direction: EdgeDirection) -> Vec<Edge> {
        let fakes = match direction {
            EdgeDirection::Outgoing => &self.fake_outgoing,
            EdgeDirection::Ingoing => &self.fake_ingoing,
        };
        fakes.get(junction).cloned().unwrap_or_default()
    }

    /// Connects `junction` to each vicinity `(edge AB, projection P)`.
    ///
    /// Adds `A->P`, `P->B` and the same pair for `BA` as part-of-real fakes,
    /// `junction->P` and `P->junction` as pure fakes, and splits every fake
    /// edge already passing through `P`.
    pub fn add_fake_edges(&mut self, junction: &Junction, vicinities: &[(Edge, Junction)]) {
        for (ab, p) in vicinities {
            let mut edges = Vec::new();
            split_edge(ab, p, &mut edges);
            split_edge(&ab.reverse(), p, &mut edges);

            edges.push(Edge::make_fake(*junction, *p, false));
            edges.push(Edge::make_fake(*p, *junction, false));

            for uv in self.fake_ingoing.values().chain(self.fake_outgoing.values()).flatten() {
                if is_point_on_segment(p.point(), uv.start().point(), uv.end().point()) {
                    split_edge(uv, p, &mut edges);
                }
            }

            for uv in edges {
                self.fake_outgoing.entry(*uv.start()).or_default().push(uv);
                self.fake_ingoing.entry(*uv.end()).or_default().push(uv);
            }
        }

        for list in self.fake_outgoing.values_mut().chain(self.fake_ingoing.values_mut()) {
            list.sort_unstable();
            list.dedup();
        }
    }

    pub fn reset_fakes(&mut self) {
        self.fake_outgoing.clear();
        self.fake_ingoing.clear();
    }

    pub fn has_fakes(&self) -> bool {
        !self.fake_outgoing.is_empty()
    }

    /// Fake edges travel at the source's max speed.
    pub fn speed_kmph(&self, edge: &Edge) -> f64 {
        match edge.feature_id() {
            Some(id) => self.source.speed_kmph(id),
            None => self.source.max_speed_kmph(),
        }
    }

    pub fn max_speed_kmph(&self) -> f64 {
        self.source.max_speed_kmph()
    }

    pub fn road_info(&self, feature_id: FeatureId) -> Option<RoadInfo> {
        self.source.road_info(feature_id)
    }

    pub fn find_closest_edges(&self, point: PointD, count: usize) -> Vec<(Edge, Junction)> {
        self.source.find_closest_edges(point, count)
    }
}

/// Splits `ab` at `p` into fake `a->p` and `p->b`; degenerate halves are skipped.
fn split_edge(ab: &Edge, p: &Junction, edges: &mut Vec<Edge>) {
    let (a, b) = (ab.start(), ab.end());
    if a.almost_equal(p, POINTS_EQUAL_EPSILON) || p.almost_equal(b, POINTS_EQUAL_EPSILON) {
        return;
    }
    let part_of_real = !ab.is_fake() || ab.is_part_of_real();
    edges.push(Edge::make_fake(*a, *p, part_of_real));
    edges.push(Edge::make_fake(*p, *b, part_of_real));
}

/// Visits each edge of `road` touching `cross` as `(segment index, other end,
/// forward)`.
fn for_each_edge(cross: &Junction, road: &RoadInfo, mut f: impl FnMut(u32, Junction, bool)) {
    let n = road.junctions.len();
    for (i, j) in road.junctions.iter().enumerate() {
        if !cross.almost_equal(j, POINTS_EQUAL_EPSILON) {
            continue;
        }
        if i + 1 < n {
            f(i as u32, road.junctions[i + 1], true);
        }
        if i > 0 {
            f((i - 1) as u32, road.junctions[i - 1], false);
        }
    }
}

fn load_cross_edges(
    cross: Junction,
    mode: Mode,
    direction: EdgeDirection,
    feature_id: FeatureId,
    road: &RoadInfo,
    edges: &mut Vec<Edge>,
) {
    let any_direction = road.bidirectional || mode == Mode::IgnoreOnewayTag;
    for_each_edge(&cross, road, |seg_id, neighbor, forward| match direction {
        EdgeDirection::Outgoing => {
            if forward || any_direction {
                edges.push(Edge::new(feature_id, forward, seg_id, cross, neighbor));
            }
        }
        EdgeDirection::Ingoing => {
            if !forward || any_direction {
                edges.push(Edge::new(feature_id, !forward, seg_id, neighbor, cross));
            }
        }
    });
}

pub fn make_road_info_for_testing(bidirectional: bool, speed_kmph: f64, points: &[PointD]) -> RoadInfo {
    RoadInfo::new(
        bidirectional,
        speed_kmph,
        points.iter().copied().map(make_junction_for_testing).collect(),
    )
}

pub fn junctions_to_points(junctions: &[Junction]) -> Vec<PointD> {
    junctions.iter().map(Junction::point).collect()
}

pub fn junctions_to_altitudes(junctions: &[Junction]) -> Vec<Altitude> {
    junctions.iter().map(Junction::altitude).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PointD {
        PointD::new(x, y)
    }

    fn j(x: f64, y: f64) -> Junction {
        make_junction_for_testing(p(x, y))
    }

    fn graph(mode: Mode, roads: Vec<(u32, RoadInfo)>) -> RoadGraph<MemoryRoadSource> {
        let mut source = MemoryRoadSource::new(mode, 90.0);
        for (id, road) in roads {
            source.add_road(FeatureId(id), road);
        }
        RoadGraph::new(source)
    }

    fn abc(bidirectional: bool) -> RoadInfo {
        make_road_info_for_testing(bidirectional, 50.0, &[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)])
    }

    #[test]
    fn test_one_way_road() {
        let g = graph(Mode::ObeyOnewayTag, vec![(1, abc(false))]);
        let b = j(1.0, 0.0);

        assert_eq!(
            g.outgoing_edges(&b),
            vec![Edge::new(FeatureId(1), true, 1, b, j(2.0, 0.0))]
        );
        assert_eq!(
            g.ingoing_edges(&b),
            vec![Edge::new(FeatureId(1), true, 0, j(0.0, 0.0), b)]
        );
    }

    #[test]
    fn test_bidirectional_road() {
        let g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let b = j(1.0, 0.0);

        let mut ends: Vec<Junction> = g.outgoing_edges(&b).iter().map(|e| *e.end()).collect();
        ends.sort();
        assert_eq!(ends, vec![j(0.0, 0.0), j(2.0, 0.0)]);

        let backward = g
            .outgoing_edges(&b)
            .into_iter()
            .find(|e| !e.is_forward())
            .unwrap();
        assert_eq!(backward.seg_id(), 0);
        assert_eq!(g.ingoing_edges(&b).len(), 2);
    }

    #[test]
    fn test_ignore_oneway_mode() {
        let g = graph(Mode::IgnoreOnewayTag, vec![(1, abc(false))]);
        assert_eq!(g.outgoing_edges(&j(1.0, 0.0)).len(), 2);
        assert_eq!(g.ingoing_edges(&j(1.0, 0.0)).len(), 2);
    }

    #[test]
    fn test_cross_matching_tolerates_coding_noise() {
        let g = graph(Mode::ObeyOnewayTag, vec![(1, abc(false))]);
        let noisy = j(1.0 + 3e-7, -2e-7);
        assert_eq!(g.outgoing_edges(&noisy).len(), 1);
        assert!(g.outgoing_edges(&j(1.0 + 1e-3, 0.0)).is_empty());
    }

    #[test]
    fn test_road_ends() {
        let g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let a = j(0.0, 0.0);
        let out = g.outgoing_edges(&a);
        assert_eq!(out, vec![Edge::new(FeatureId(1), true, 0, a, j(1.0, 0.0))]);
    }

    #[test]
    fn test_add_fake_edges() {
        let mut g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let start = j(0.5, 1.0);
        let proj = j(0.5, 0.0);
        let ab = Edge::new(FeatureId(1), true, 0, j(0.0, 0.0), j(1.0, 0.0));
        g.add_fake_edges(&start, &[(ab, proj)]);

        assert_eq!(g.fake_edges(&start, EdgeDirection::Outgoing), vec![Edge::make_fake(start, proj, false)]);
        assert_eq!(g.fake_edges(&start, EdgeDirection::Ingoing), vec![Edge::make_fake(proj, start, false)]);

        let mut from_proj = g.fake_edges(&proj, EdgeDirection::Outgoing);
        from_proj.sort();
        let mut expected = vec![
            Edge::make_fake(proj, start, false),
            Edge::make_fake(proj, j(1.0, 0.0), true),
            Edge::make_fake(proj, j(0.0, 0.0), true),
        ];
        expected.sort();
        assert_eq!(from_proj, expected);

        // The real vertex now also reaches the projection
        let out_a = g.outgoing_edges(&j(0.0, 0.0));
        assert!(out_a.contains(&Edge::make_fake(j(0.0, 0.0), proj, true)));
        assert!(out_a.iter().any(|e| !e.is_fake()));
        assert_eq!(g.speed_kmph(&out_a[out_a.len() - 1]), 90.0);
    }

    #[test]
    fn test_second_point_splits_existing_fakes() {
        let mut g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let ab = Edge::new(FeatureId(1), true, 0, j(0.0, 0.0), j(1.0, 0.0));
        g.add_fake_edges(&j(0.5, 1.0), &[(ab, j(0.5, 0.0))]);
        // Projection (0.25, 0) lies on the fake A->(0.5, 0)
        g.add_fake_edges(&j(0.25, 1.0), &[(ab, j(0.25, 0.0))]);

        let out = g.fake_edges(&j(0.25, 0.0), EdgeDirection::Outgoing);
        assert!(out.contains(&Edge::make_fake(j(0.25, 0.0), j(0.5, 0.0), true)));
        let deduped = {
            let mut d = out.clone();
            d.dedup();
            d
        };
        assert_eq!(deduped, out);
    }

    #[test]
    fn test_reset_fakes_leaves_only_regular_edges() {
        let mut g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let a = j(0.0, 0.0);
        let regular = g.outgoing_edges(&a);

        let ab = Edge::new(FeatureId(1), true, 0, a, j(1.0, 0.0));
        g.add_fake_edges(&j(0.5, 1.0), &[(ab, j(0.5, 0.0))]);
        assert_ne!(g.outgoing_edges(&a), regular);

        g.reset_fakes();
        g.add_fake_edges(&a, &[]);
        assert!(!g.has_fakes());
        assert_eq!(g.outgoing_edges(&a), regular);
        assert_eq!(g.regular_edges(&a, EdgeDirection::Outgoing), regular);
    }

    #[test]
    fn test_speed_of_real_edge() {
        let g = graph(Mode::ObeyOnewayTag, vec![(1, abc(true))]);
        let e = Edge::new(FeatureId(1), true, 0, j(0.0, 0.0), j(1.0, 0.0));
        assert_eq!(g.speed_kmph(&e), 50.0);
        assert_eq!(g.max_speed_kmph(), 90.0);
    }

    #[test]
    fn test_junction_helpers() {
        let road = make_road_info_for_testing(true, 10.0, &[p(1.0, 2.0), p(3.0, 4.0)]);
        assert_eq!(junctions_to_points(&road.junctions), vec![p(1.0, 2.0), p(3.0, 4.0)]);
        assert_eq!(junctions_to_altitudes(&road.junctions), vec![0, 0]);
    }
}
