//! Bicycle model - tag semantics for cycling

use super::{is_denied, is_yes, tagged_one_way, VehicleModel};
use crate::feature::Feature;

const MAX_SPEED_KMPH: f64 = 20.0;

pub struct BicycleModel;

impl BicycleModel {
    fn road_speed(feature: &Feature) -> Option<f64> {
        let highway = feature.tag("highway")?;
        let bicycle = feature.tag("bicycle");

        let speed = match highway {
            "cycleway" => 18.0,
            "primary" | "primary_link" | "secondary" | "secondary_link" => 16.0,
            "tertiary" | "tertiary_link" | "unclassified" | "residential" => 16.0,
            "living_street" | "service" => 12.0,
            "path" | "track" => 12.0,
            // Pedestrian infrastructure only when explicitly signed for bikes
            "footway" | "pedestrian" if is_yes(bicycle) || bicycle == Some("designated") => 8.0,
            _ => return None,
        };

        if is_denied(bicycle) || (is_denied(feature.tag("access")) && !is_yes(bicycle)) {
            return None;
        }
        Some(speed)
    }
}

impl VehicleModel for BicycleModel {
    fn is_road(&self, feature: &Feature) -> bool {
        Self::road_speed(feature).is_some()
    }

    fn is_one_way(&self, feature: &Feature) -> bool {
        if feature.tag("oneway:bicycle") == Some("no") {
            return false;
        }
        tagged_one_way(feature) || feature.tag("junction") == Some("roundabout")
    }

    fn speed_kmph(&self, feature: &Feature) -> f64 {
        Self::road_speed(feature).unwrap_or(0.0)
    }

    fn max_speed_kmph(&self) -> f64 {
        MAX_SPEED_KMPH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footway_needs_bicycle_tag() {
        let footway = Feature::new(1, vec![]).with_tag("highway", "footway");
        assert!(!BicycleModel.is_road(&footway));
        assert!(BicycleModel.is_road(&footway.with_tag("bicycle", "yes")));
    }

    #[test]
    fn test_contraflow_cycling() {
        let street = Feature::new(1, vec![])
            .with_tag("highway", "residential")
            .with_tag("oneway", "yes");
        assert!(BicycleModel.is_one_way(&street));
        assert!(!BicycleModel.is_one_way(&street.with_tag("oneway:bicycle", "no")));
    }
}
