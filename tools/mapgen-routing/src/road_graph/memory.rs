//! In-memory road source with an R-tree over road segments

use mapgen_common::Result;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::{BTreeMap, BTreeSet};

use super::{Edge, Junction, Mode, RoadInfo, RoadSource, DEFAULT_ALTITUDE_METERS};
use crate::feature::{FeatureId, FeatureSource};
use crate::geometry::{project_on_segment, PointD, POINTS_EQUAL_EPSILON};
use crate::profiles::VehicleModel;

/// Segment `seg_id` of a road for the R-tree
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedSegment {
    a: [f64; 2],
    b: [f64; 2],
    feature_id: FeatureId,
    seg_id: u32,
}

impl IndexedSegment {
    fn projection(&self, point: &[f64; 2]) -> PointD {
        project_on_segment(PointD::from(*point), PointD::from(self.a), PointD::from(self.b))
    }
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for IndexedSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let proj = self.projection(point);
        let dx = proj.x - point[0];
        let dy = proj.y - point[1];
        dx * dx + dy * dy
    }
}

pub struct MemoryRoadSource {
    mode: Mode,
    max_speed_kmph: f64,
    roads: BTreeMap<FeatureId, RoadInfo>,
    tree: RTree<IndexedSegment>,
}

impl MemoryRoadSource {
    pub fn new(mode: Mode, max_speed_kmph: f64) -> Self {
        Self {
            mode,
            max_speed_kmph,
            roads: BTreeMap::new(),
            tree: RTree::new(),
        }
    }

    /// Roads of `features` as seen by `model`.
    pub fn load(features: &dyn FeatureSource, model: &dyn VehicleModel, mode: Mode) -> Result<Self> {
        let mut roads = BTreeMap::new();
        features.for_each_feature(&mut |f| {
            if !model.is_road(f) || f.points.len() < 2 {
                return;
            }
            let junctions = f
                .points
                .iter()
                .map(|&p| Junction::new(p, DEFAULT_ALTITUDE_METERS))
                .collect();
            roads.insert(
                f.id,
                RoadInfo::new(!model.is_one_way(f), model.speed_kmph(f), junctions),
            );
        })?;

        let segments = roads.iter().flat_map(|(&id, road)| segments_of(id, road)).collect();
        Ok(Self {
            mode,
            max_speed_kmph: model.max_speed_kmph(),
            roads,
            tree: RTree::bulk_load(segments),
        })
    }

    /// Adds or replaces a road.
    pub fn add_road(&mut self, feature_id: FeatureId, road: RoadInfo) {
        if let Some(old) = self.roads.remove(&feature_id) {
            for segment in segments_of(feature_id, &old) {
                self.tree.remove(&segment);
            }
        }
        for segment in segments_of(feature_id, &road) {
            self.tree.insert(segment);
        }
        self.roads.insert(feature_id, road);
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }
}

fn segments_of(feature_id: FeatureId, road: &RoadInfo) -> Vec<IndexedSegment> {
    road.junctions
        .windows(2)
        .enumerate()
        .map(|(i, pair)| IndexedSegment {
            a: pair[0].point().into(),
            b: pair[1].point().into(),
            feature_id,
            seg_id: i as u32,
        })
        .collect()
}

impl RoadSource for MemoryRoadSource {
    fn road_info(&self, feature_id: FeatureId) -> Option<RoadInfo> {
        self.roads.get(&feature_id).cloned()
    }

    fn speed_kmph(&self, feature_id: FeatureId) -> f64 {
        self.roads.get(&feature_id).map_or(0.0, |r| r.speed_kmph)
    }

    fn max_speed_kmph(&self) -> f64 {
        self.max_speed_kmph
    }

    fn for_each_feature_closest_to_cross(&self, cross: PointD, f: &mut dyn FnMut(FeatureId, &RoadInfo)) {
        let query: [f64; 2] = cross.into();
        let features: BTreeSet<FeatureId> = self
            .tree
            .locate_within_distance(query, POINTS_EQUAL_EPSILON * POINTS_EQUAL_EPSILON * 4.0)
            .map(|s| s.feature_id)
            .collect();
        for id in features {
            if let Some(road) = self.roads.get(&id) {
                f(id, road);
            }
        }
    }

    fn find_closest_edges(&self, point: PointD, count: usize) -> Vec<(Edge, Junction)> {
        let query: [f64; 2] = point.into();
        self.tree
            .nearest_neighbor_iter(&query)
            .filter_map(|s| {
                let road = self.roads.get(&s.feature_id)?;
                let i = s.seg_id as usize;
                let edge = Edge::new(
                    s.feature_id,
                    true,
                    s.seg_id,
                    *road.junctions.get(i)?,
                    *road.junctions.get(i + 1)?,
                );
                Some((edge, Junction::new(s.projection(&query), DEFAULT_ALTITUDE_METERS)))
            })
            .take(count)
            .collect()
    }

    fn mode(&self) -> Mode {
        self.mode
    }
}
