//! Per-feature road geometry for a single vehicle model

use mapgen_common::Result;
use rustc_hash::FxHashMap;

use crate::feature::{FeatureId, FeatureSource};
use crate::geometry::PointD;
use crate::profiles::VehicleModel;

#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    pub points: Vec<PointD>,
    pub speed_kmph: f64,
    pub one_way: bool,
}

impl RoadGeometry {
    pub fn new(points: Vec<PointD>, speed_kmph: f64, one_way: bool) -> Self {
        Self {
            points,
            speed_kmph,
            one_way,
        }
    }

    pub fn points_count(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, idx: u32) -> Option<PointD> {
        self.points.get(idx as usize).copied()
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2 && self.speed_kmph > 0.0
    }
}

/// Roads usable by one vehicle model, keyed by feature.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    roads: FxHashMap<FeatureId, RoadGeometry>,
}

impl Geometry {
    /// Reads every feature the model accepts as a road.
    pub fn load(features: &dyn FeatureSource, model: &dyn VehicleModel) -> Result<Self> {
        let mut geometry = Geometry::default();
        features.for_each_feature(&mut |f| {
            if !model.is_road(f) {
                return;
            }
            let road = RoadGeometry::new(f.points.clone(), model.speed_kmph(f), model.is_one_way(f));
            if road.is_valid() {
                geometry.roads.insert(f.id, road);
            }
        })?;
        Ok(geometry)
    }

    pub fn insert(&mut self, feature_id: FeatureId, road: RoadGeometry) {
        self.roads.insert(feature_id, road);
    }

    /// Missing features read as invalid roads.
    pub fn road(&self, feature_id: FeatureId) -> Option<&RoadGeometry> {
        self.roads.get(&feature_id).filter(|r| r.is_valid())
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }
}
