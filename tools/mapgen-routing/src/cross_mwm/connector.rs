//! Border enters/exits of one vehicle type and the leap weights between them

use rustc_hash::FxHashMap;

use crate::feature::FeatureId;
use crate::geometry::PointD;
use crate::index_graph::{Segment, SegmentEdge, Weight};

/// Weight of an enter/exit pair with no path between them.
pub const NO_ROUTE: Weight = Weight::MAX;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ConnectorTransition {
    one_way: bool,
    forward_is_enter: bool,
    back_point: PointD,
    front_point: PointD,
}

#[derive(Debug, Clone, Default)]
pub struct CrossMwmConnector {
    enters: Vec<Segment>,
    exits: Vec<Segment>,
    enter_index: FxHashMap<Segment, usize>,
    exit_index: FxHashMap<Segment, usize>,
    transitions: FxHashMap<(FeatureId, u32), ConnectorTransition>,
    /// Row-major `enters × exits`; empty until [`fill_weights`](Self::fill_weights).
    weights: Vec<Weight>,
}

impl CrossMwmConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the border crossing of segment `segment_idx` of a feature.
    ///
    /// The forward segment becomes an enter if `forward_is_enter`, otherwise an
    /// exit. Unless the road is one-way, the backward segment is registered as
    /// the opposite kind.
    pub fn add_transition(
        &mut self,
        feature_id: FeatureId,
        segment_idx: u32,
        one_way: bool,
        forward_is_enter: bool,
        back_point: PointD,
        front_point: PointD,
    ) {
        let forward = Segment::new(feature_id, segment_idx, true);
        let backward = forward.reversed();

        if forward_is_enter {
            self.add_enter(forward);
        } else {
            self.add_exit(forward);
        }
        if !one_way {
            if forward_is_enter {
                self.add_exit(backward);
            } else {
                self.add_enter(backward);
            }
        }

        self.transitions.insert(
            (feature_id, segment_idx),
            ConnectorTransition {
                one_way,
                forward_is_enter,
                back_point,
                front_point,
            },
        );
    }

    /// Registers a bare enter segment. Returns its index.
    pub fn add_enter(&mut self, segment: Segment) -> usize {
        register(&mut self.enters, &mut self.enter_index, segment)
    }

    /// Registers a bare exit segment. Returns its index.
    pub fn add_exit(&mut self, segment: Segment) -> usize {
        register(&mut self.exits, &mut self.exit_index, segment)
    }

    pub fn enters(&self) -> &[Segment] {
        &self.enters
    }

    pub fn exits(&self) -> &[Segment] {
        &self.exits
    }

    pub fn enter(&self, idx: usize) -> Option<&Segment> {
        self.enters.get(idx)
    }

    pub fn exit(&self, idx: usize) -> Option<&Segment> {
        self.exits.get(idx)
    }

    pub fn enter_idx(&self, segment: &Segment) -> Option<usize> {
        self.enter_index.get(segment).copied()
    }

    pub fn exit_idx(&self, segment: &Segment) -> Option<usize> {
        self.exit_index.get(segment).copied()
    }

    /// `segment` leaves the region (`is_outgoing`) or enters it.
    pub fn is_transition(&self, segment: &Segment, is_outgoing: bool) -> bool {
        let Some(t) = self
            .transitions
            .get(&(segment.feature_id, segment.segment_idx))
        else {
            return false;
        };
        if t.one_way && !segment.forward {
            return false;
        }
        (segment.forward == t.forward_is_enter) == !is_outgoing
    }

    /// End point (`front`) or start point of a transition segment.
    pub fn transition_point(&self, segment: &Segment, front: bool) -> Option<PointD> {
        let t = self
            .transitions
            .get(&(segment.feature_id, segment.segment_idx))?;
        Some(if segment.forward == front {
            t.front_point
        } else {
            t.back_point
        })
    }

    pub fn has_weights(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Fills the whole table; `calc` returns [`NO_ROUTE`] for unreachable pairs.
    pub fn fill_weights(&mut self, mut calc: impl FnMut(&Segment, &Segment) -> Weight) {
        let mut weights = Vec::with_capacity(self.enters.len() * self.exits.len());
        for enter in &self.enters {
            for exit in &self.exits {
                weights.push(calc(enter, exit));
            }
        }
        self.weights = weights;
    }

    /// Row-major weight table, empty when weights were never filled.
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    /// Installs a stored weight table; its length must be `enters × exits`.
    pub fn set_weights(&mut self, weights: Vec<Weight>) -> bool {
        if weights.len() != self.enters.len() * self.exits.len() {
            return false;
        }
        self.weights = weights;
        true
    }

    /// Weight by indices; [`NO_ROUTE`] when unknown or unreachable.
    pub fn weight(&self, enter_idx: usize, exit_idx: usize) -> Weight {
        if enter_idx >= self.enters.len() || exit_idx >= self.exits.len() {
            return NO_ROUTE;
        }
        self.weights
            .get(enter_idx * self.exits.len() + exit_idx)
            .copied()
            .unwrap_or(NO_ROUTE)
    }

    pub fn leap_weight(&self, enter: &Segment, exit: &Segment) -> Option<Weight> {
        let w = self.weight(self.enter_idx(enter)?, self.exit_idx(exit)?);
        (w != NO_ROUTE).then_some(w)
    }

    /// Leaps from `enter` to every reachable exit.
    pub fn outgoing_leaps(&self, enter: &Segment) -> Vec<SegmentEdge> {
        let Some(i) = self.enter_idx(enter) else {
            return Vec::new();
        };
        self.exits
            .iter()
            .enumerate()
            .filter_map(|(j, exit)| {
                let w = self.weight(i, j);
                (w != NO_ROUTE).then(|| SegmentEdge::new(*exit, w))
            })
            .collect()
    }

    /// Leaps into `exit` from every enter that reaches it.
    pub fn ingoing_leaps(&self, exit: &Segment) -> Vec<SegmentEdge> {
        let Some(j) = self.exit_idx(exit) else {
            return Vec::new();
        };
        self.enters
            .iter()
            .enumerate()
            .filter_map(|(i, enter)| {
                let w = self.weight(i, j);
                (w != NO_ROUTE).then(|| SegmentEdge::new(*enter, w))
            })
            .collect()
    }
}

fn register(list: &mut Vec<Segment>, index: &mut FxHashMap<Segment, usize>, segment: Segment) -> usize {
    *index.entry(segment).or_insert_with(|| {
        list.push(segment);
        list.len() - 1
    })
}
