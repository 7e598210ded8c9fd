//! Routing graph construction from the region's feature stream

use mapgen_common::Result;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::feature::{Feature, FeatureId, FeatureSource};
use crate::geometry::PointKey;
use crate::index_graph::{IndexGraph, Joint, RoadPoint};
use crate::vehicle_mask::{VehicleMask, VehicleMaskBuilder};

/// Collects road masks and coincident road points over one pass of features.
pub struct Processor<'a> {
    mask_builder: &'a VehicleMaskBuilder,
    coord_bits: u8,
    pos_to_joint: FxHashMap<PointKey, Joint>,
    masks: BTreeMap<FeatureId, VehicleMask>,
}

impl<'a> Processor<'a> {
    /// `coord_bits` must match the precision of the region's coding params.
    pub fn new(mask_builder: &'a VehicleMaskBuilder, coord_bits: u8) -> Self {
        Self {
            mask_builder,
            coord_bits,
            pos_to_joint: FxHashMap::default(),
            masks: BTreeMap::new(),
        }
    }

    pub fn process_all_features(&mut self, features: &dyn FeatureSource) -> Result<()> {
        features.for_each_feature(&mut |f| self.process_feature(f))
    }

    pub fn process_feature(&mut self, feature: &Feature) {
        let mask = self.mask_builder.calc_road_mask(feature);
        if mask.is_empty() {
            return;
        }

        self.masks.insert(feature.id, mask);
        for (i, &point) in feature.points.iter().enumerate() {
            let key = PointKey::new(point, self.coord_bits);
            self.pos_to_joint
                .entry(key)
                .or_default()
                .add_point(RoadPoint::new(feature.id, i as u32));
        }
    }

    /// Joints for every location shared by two or more road points, in a
    /// deterministic order.
    pub fn joints(&self) -> Vec<Joint> {
        let mut joints: Vec<Joint> = self
            .pos_to_joint
            .values()
            .filter(|joint| joint.size() >= 2)
            .map(|joint| joint.clone().normalized())
            .collect();
        joints.sort_unstable_by(|a, b| a.points().cmp(b.points()));
        joints
    }

    pub fn build_graph(&self, graph: &mut IndexGraph) {
        graph.import(self.joints());
    }

    pub fn masks(&self) -> &BTreeMap<FeatureId, VehicleMask> {
        &self.masks
    }
}
