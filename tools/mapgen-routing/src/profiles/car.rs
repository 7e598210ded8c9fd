//! Car model - tag semantics for automobile routing

use super::{is_denied, tagged_one_way, VehicleModel};
use crate::feature::Feature;

/// Speeds are capped at `max_speed_kmph` so leap weights stay admissible
/// against the query-time heuristic.
pub struct CarModel {
    max_speed_kmph: f64,
}

impl Default for CarModel {
    fn default() -> Self {
        Self {
            max_speed_kmph: 110.0,
        }
    }
}

impl CarModel {
    pub fn with_max_speed(max_speed_kmph: f64) -> Self {
        Self { max_speed_kmph }
    }

    fn base_speed(highway: &str) -> Option<f64> {
        let speed = match highway {
            "motorway" => 110.0,
            "motorway_link" => 60.0,
            "trunk" => 90.0,
            "trunk_link" => 50.0,
            "primary" => 70.0,
            "primary_link" => 40.0,
            "secondary" => 60.0,
            "secondary_link" => 40.0,
            "tertiary" => 50.0,
            "tertiary_link" => 30.0,
            "unclassified" => 50.0,
            "residential" => 30.0,
            "service" => 20.0,
            "living_street" => 10.0,
            _ => return None,
        };
        Some(speed)
    }

    fn road_speed(&self, feature: &Feature) -> Option<f64> {
        let speed = Self::base_speed(feature.tag("highway")?)?;
        if is_denied(feature.tag("motor_vehicle"))
            || is_denied(feature.tag("vehicle"))
            || is_denied(feature.tag("access"))
        {
            return None;
        }
        Some(speed.min(self.max_speed_kmph))
    }
}

impl VehicleModel for CarModel {
    fn is_road(&self, feature: &Feature) -> bool {
        self.road_speed(feature).is_some()
    }

    fn is_one_way(&self, feature: &Feature) -> bool {
        if tagged_one_way(feature) || feature.tag("junction") == Some("roundabout") {
            return true;
        }
        // Motorways are one-way unless tagged otherwise
        matches!(feature.tag("highway"), Some("motorway") | Some("motorway_link"))
            && feature.tag("oneway") != Some("no")
    }

    fn speed_kmph(&self, feature: &Feature) -> f64 {
        self.road_speed(feature).unwrap_or(0.0)
    }

    fn max_speed_kmph(&self) -> f64 {
        self.max_speed_kmph
    }
}
