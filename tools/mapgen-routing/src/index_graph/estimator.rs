use super::road_geometry::RoadGeometry;
use super::segment::Segment;
use super::Weight;
use crate::geometry::haversine_distance;

/// Travel time estimates in deciseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEstimator {
    max_speed_kmph: f64,
}

impl EdgeEstimator {
    pub fn for_car(max_speed_kmph: f64) -> Self {
        Self { max_speed_kmph }
    }

    pub fn max_speed_kmph(&self) -> f64 {
        self.max_speed_kmph
    }

    /// Length of the segment over the road's speed, never faster than max speed.
    pub fn calc_segment_weight(&self, segment: &Segment, road: &RoadGeometry) -> Weight {
        let (Some(a), Some(b)) = (
            road.point(segment.segment_idx),
            road.point(segment.segment_idx + 1),
        ) else {
            return 0;
        };

        let speed_kmph = road.speed_kmph.min(self.max_speed_kmph);
        if speed_kmph <= 0.0 {
            return 0;
        }
        let speed_mps = speed_kmph / 3.6;
        let deciseconds = haversine_distance(a, b) / speed_mps * 10.0;
        deciseconds.round().min(f64::from(Weight::MAX - 1)) as Weight
    }
}

impl Default for EdgeEstimator {
    fn default() -> Self {
        Self::for_car(110.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureId;
    use crate::geometry::PointD;

    #[test]
    fn test_segment_weight_deciseconds() {
        // ~111 m at 36 km/h (10 m/s) = ~11.1 s
        let road = RoadGeometry::new(
            vec![PointD::new(0.0, 0.0), PointD::new(0.0, 0.001)],
            36.0,
            false,
        );
        let estimator = EdgeEstimator::for_car(110.0);
        let fwd = Segment::new(FeatureId(1), 0, true);
        let w = estimator.calc_segment_weight(&fwd, &road);
        assert!((110..=112).contains(&w), "got {w}");
        assert_eq!(estimator.calc_segment_weight(&fwd.reversed(), &road), w);
    }

    #[test]
    fn test_speed_clamped_to_max() {
        let road = RoadGeometry::new(
            vec![PointD::new(0.0, 0.0), PointD::new(0.0, 0.001)],
            200.0,
            false,
        );
        let seg = Segment::new(FeatureId(1), 0, true);
        let fast = EdgeEstimator::for_car(200.0).calc_segment_weight(&seg, &road);
        let capped = EdgeEstimator::for_car(50.0).calc_segment_weight(&seg, &road);
        assert!(capped > fast);
    }

    #[test]
    fn test_out_of_range_segment_is_free() {
        let road = RoadGeometry::new(vec![PointD::new(0.0, 0.0)], 30.0, false);
        let seg = Segment::new(FeatureId(1), 3, true);
        assert_eq!(EdgeEstimator::default().calc_segment_weight(&seg, &road), 0);
    }
}
