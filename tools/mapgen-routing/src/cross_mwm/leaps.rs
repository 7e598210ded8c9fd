//! Border-to-border travel costs
//!
//! One Dijkstra sweep per enter segment over the whole regional graph. Sweeps
//! share nothing but the immutable graph, so they run on rayon with one output
//! row per enter.

use mapgen_common::{Error, Result};
use priority_queue::PriorityQueue;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use super::connector::{CrossMwmConnector, NO_ROUTE};
use crate::index_graph::{IndexGraph, Segment, Weight};

pub struct LeapWeightComputer<'a> {
    graph: &'a IndexGraph,
    progress_interval: usize,
}

impl<'a> LeapWeightComputer<'a> {
    /// Logs progress every `progress_interval` finished sweeps; 0 disables it.
    pub fn new(graph: &'a IndexGraph, progress_interval: usize) -> Self {
        Self {
            graph,
            progress_interval,
        }
    }

    /// Distances from `source` to every reachable segment, `source` itself at 0.
    pub fn sweep(&self, source: Segment) -> FxHashMap<Segment, Weight> {
        let mut dist: FxHashMap<Segment, Weight> = FxHashMap::default();
        let mut pq: PriorityQueue<Segment, Reverse<Weight>> = PriorityQueue::new();

        dist.insert(source, 0);
        pq.push(source, Reverse(0));

        while let Some((u, Reverse(d))) = pq.pop() {
            if dist.get(&u).is_some_and(|&best| d > best) {
                continue;
            }

            for edge in self.graph.edges(&u, true) {
                let new_dist = d.saturating_add(edge.weight);
                if new_dist == NO_ROUTE {
                    continue;
                }
                if dist.get(&edge.target).map_or(true, |&best| new_dist < best) {
                    dist.insert(edge.target, new_dist);
                    pq.push(edge.target, Reverse(new_dist));
                }
            }
        }

        dist
    }

    /// Weights from `enter` to each of `exits`, [`NO_ROUTE`] where unreachable.
    pub fn row(&self, enter: Segment, exits: &[Segment]) -> Vec<Weight> {
        let dist = self.sweep(enter);
        exits
            .iter()
            .map(|exit| dist.get(exit).copied().unwrap_or(NO_ROUTE))
            .collect()
    }

    /// Fills the connector's weight table, on a dedicated pool of `threads`
    /// workers when given, otherwise on the global rayon pool.
    pub fn fill_weights(&self, connector: &mut CrossMwmConnector, threads: Option<usize>) -> Result<()> {
        let start = Instant::now();
        let enters = connector.enters().to_vec();
        let exits = connector.exits().to_vec();
        let total = enters.len();
        let done = AtomicUsize::new(0);

        let compute = || -> Vec<Vec<Weight>> {
            enters
                .par_iter()
                .map(|&enter| {
                    let row = self.row(enter, &exits);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.progress_interval > 0 && finished % self.progress_interval == 0 {
                        info!(waves = finished, total, "Leaps progress");
                    }
                    row
                })
                .collect()
        };

        let rows = match threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::invalid_input(format!("leap thread pool: {e}")))?
                .install(compute),
            None => compute(),
        };

        if !connector.set_weights(rows.concat()) {
            return Err(Error::corrupt("leap weight table does not match connector shape"));
        }
        debug!(enters = total, exits = exits.len(), "Leap table filled");
        info!(
            elapsed_s = start.elapsed().as_secs_f64(),
            "Leaps finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureId;
    use crate::geometry::PointD;
    use crate::index_graph::{EdgeEstimator, Geometry, Joint, RoadGeometry, RoadPoint};

    fn road(points: &[(f64, f64)], one_way: bool) -> RoadGeometry {
        RoadGeometry::new(
            points.iter().map(|&(x, y)| PointD::new(x, y)).collect(),
            36.0,
            one_way,
        )
    }

    /// Road 0 runs west to east along y=0, road 1 is a one-way north to south
    /// road meeting it at (0.001, 0).
    fn graph() -> IndexGraph {
        let mut geometry = Geometry::default();
        geometry.insert(
            FeatureId(0),
            road(&[(0.0, 0.0), (0.001, 0.0), (0.002, 0.0)], false),
        );
        geometry.insert(FeatureId(1), road(&[(0.001, 0.001), (0.001, 0.0)], true));
        let mut graph = IndexGraph::new(geometry, EdgeEstimator::for_car(110.0));
        graph.import(vec![Joint::new(vec![
            RoadPoint::new(FeatureId(0), 1),
            RoadPoint::new(FeatureId(1), 1),
        ])]);
        graph
    }

    #[test]
    fn test_sweep_sums_segment_weights() {
        let graph = graph();
        let computer = LeapWeightComputer::new(&graph, 0);
        let from = Segment::new(FeatureId(1), 0, true);
        let dist = computer.sweep(from);

        assert_eq!(dist[&from], 0);
        let east = Segment::new(FeatureId(0), 1, true);
        assert_eq!(dist[&east], graph.calc_segment_weight(&east));
        assert!(dist.contains_key(&Segment::new(FeatureId(0), 0, false)));
    }

    #[test]
    fn test_one_way_blocks_reverse_sweep() {
        let graph = graph();
        let computer = LeapWeightComputer::new(&graph, 0);
        let dist = computer.sweep(Segment::new(FeatureId(0), 0, true));
        assert!(!dist.contains_key(&Segment::new(FeatureId(1), 0, false)));
        assert!(!dist.contains_key(&Segment::new(FeatureId(1), 0, true)));
    }

    #[test]
    fn test_fill_weights_on_dedicated_pool() {
        let graph = graph();
        let enter = Segment::new(FeatureId(1), 0, true);
        let exit = Segment::new(FeatureId(0), 1, true);
        let unreachable = Segment::new(FeatureId(1), 0, false);

        let mut connector = CrossMwmConnector::new();
        connector.add_enter(enter);
        connector.add_exit(enter);
        connector.add_exit(exit);
        connector.add_exit(unreachable);

        LeapWeightComputer::new(&graph, 1)
            .fill_weights(&mut connector, Some(2))
            .unwrap();

        assert!(connector.has_weights());
        assert_eq!(connector.leap_weight(&enter, &enter), Some(0));
        assert_eq!(
            connector.leap_weight(&enter, &exit),
            Some(graph.calc_segment_weight(&exit))
        );
        assert_eq!(connector.weight(0, 2), NO_ROUTE);
        assert_eq!(connector.leap_weight(&enter, &unreachable), None);
    }

    #[test]
    fn test_empty_connector() {
        let graph = graph();
        let mut connector = CrossMwmConnector::new();
        LeapWeightComputer::new(&graph, 10)
            .fill_weights(&mut connector, None)
            .unwrap();
        assert!(!connector.has_weights());
    }
}
