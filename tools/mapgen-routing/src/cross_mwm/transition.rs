//! Border crossing detection

use mapgen_common::Result;

use super::connector::CrossMwmConnector;
use super::ConnectorsPerVehicle;
use crate::borders::Borders;
use crate::feature::{Feature, FeatureId, FeatureSource};
use crate::geometry::PointD;
use crate::vehicle_mask::{VehicleMask, VehicleMaskBuilder, VehicleType};

/// One road segment whose endpoints lie on different sides of the border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub feature_id: FeatureId,
    pub segment_idx: u32,
    pub road_mask: VehicleMask,
    pub one_way_mask: VehicleMask,
    /// Travelling forward along the segment enters the region.
    pub forward_is_enter: bool,
    pub back_point: PointD,
    pub front_point: PointD,
}

impl Transition {
    /// Registers the transition in `connector` if `vehicle` may use the road.
    pub fn register(&self, vehicle: VehicleType, connector: &mut CrossMwmConnector) {
        if !self.road_mask.contains(vehicle) {
            return;
        }
        connector.add_transition(
            self.feature_id,
            self.segment_idx,
            self.one_way_mask.contains(vehicle),
            self.forward_is_enter,
            self.back_point,
            self.front_point,
        );
    }
}

/// Walks road features and records where they cross the region border.
pub struct BorderTransitionDetector<'a> {
    borders: &'a Borders,
    mask_builder: &'a VehicleMaskBuilder,
    transitions: Vec<Transition>,
    connectors: ConnectorsPerVehicle,
}

impl<'a> BorderTransitionDetector<'a> {
    pub fn new(borders: &'a Borders, mask_builder: &'a VehicleMaskBuilder) -> Self {
        Self {
            borders,
            mask_builder,
            transitions: Vec::new(),
            connectors: ConnectorsPerVehicle::default(),
        }
    }

    pub fn process_all_features(&mut self, features: &dyn FeatureSource) -> Result<()> {
        features.for_each_feature(&mut |f| self.process_feature(f))
    }

    pub fn process_feature(&mut self, feature: &Feature) {
        let road_mask = self.mask_builder.calc_road_mask(feature);
        if road_mask.is_empty() {
            return;
        }
        let Some(&first) = feature.points.first() else {
            return;
        };
        let one_way_mask = self.mask_builder.calc_one_way_mask(feature);

        let mut prev_inside = self.borders.contains(first);
        for (i, pair) in feature.points.windows(2).enumerate() {
            let curr_inside = self.borders.contains(pair[1]);
            if curr_inside == prev_inside {
                continue;
            }

            let transition = Transition {
                feature_id: feature.id,
                segment_idx: i as u32,
                road_mask,
                one_way_mask,
                forward_is_enter: curr_inside,
                back_point: pair[0],
                front_point: pair[1],
            };
            for &vehicle in VehicleType::all() {
                transition.register(vehicle, self.connectors.get_mut(vehicle));
            }
            self.transitions.push(transition);
            prev_inside = curr_inside;
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn finish(self) -> (Vec<Transition>, ConnectorsPerVehicle) {
        (self.transitions, self.connectors)
    }
}

/// Detects every transition of the region and builds the connector skeletons.
pub fn calc_cross_mwm_transitions(
    borders: &Borders,
    mask_builder: &VehicleMaskBuilder,
    features: &dyn FeatureSource,
) -> Result<(Vec<Transition>, ConnectorsPerVehicle)> {
    let mut detector = BorderTransitionDetector::new(borders, mask_builder);
    detector.process_all_features(features)?;
    Ok(detector.finish())
}
