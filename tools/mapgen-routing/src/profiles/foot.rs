//! Pedestrian model - tag semantics for walking

use super::{is_denied, VehicleModel};
use crate::feature::Feature;

const MAX_SPEED_KMPH: f64 = 5.0;

pub struct PedestrianModel;

impl PedestrianModel {
    fn road_speed(feature: &Feature) -> Option<f64> {
        let speed = match feature.tag("highway")? {
            "footway" | "pedestrian" | "steps" => 5.0,
            "path" | "cycleway" => 4.5,
            "residential" | "living_street" | "unclassified" => 5.0,
            "tertiary" | "secondary" | "primary" => 4.5,
            "tertiary_link" | "secondary_link" | "primary_link" => 4.5,
            "service" => 4.5,
            "track" => 4.0,
            _ => return None,
        };
        if is_denied(feature.tag("foot")) {
            return None;
        }
        Some(speed)
    }
}

impl VehicleModel for PedestrianModel {
    fn is_road(&self, feature: &Feature) -> bool {
        Self::road_speed(feature).is_some()
    }

    // Pedestrians ignore oneway restrictions
    fn is_one_way(&self, _feature: &Feature) -> bool {
        false
    }

    fn speed_kmph(&self, feature: &Feature) -> f64 {
        Self::road_speed(feature).unwrap_or(0.0)
    }

    fn max_speed_kmph(&self) -> f64 {
        MAX_SPEED_KMPH
    }
}
