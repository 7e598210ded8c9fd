//! Per-vehicle traversability masks
//!
//! A road feature carries two masks: which vehicle types may use it at all
//! (road mask) and for which of them it is one-way (one-way mask).

use mapgen_common::{suggest_correction, Error, Result};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::Arc;

use crate::feature::Feature;
use crate::profiles::{VehicleModel, VehicleModelFactory};

/// Vehicle types in connector order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleType {
    Pedestrian = 0,
    Bicycle = 1,
    Car = 2,
}

impl VehicleType {
    pub const COUNT: usize = 3;

    pub fn all() -> &'static [VehicleType] {
        &[VehicleType::Pedestrian, VehicleType::Bicycle, VehicleType::Car]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            VehicleType::Pedestrian => "pedestrian",
            VehicleType::Bicycle => "bicycle",
            VehicleType::Car => "car",
        }
    }

    pub fn mask(self) -> VehicleMask {
        VehicleMask(1 << self as u8)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitset over [`VehicleType`]: bit0 = pedestrian, bit1 = bicycle, bit2 = car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VehicleMask(u8);

impl VehicleMask {
    pub const NONE: VehicleMask = VehicleMask(0);
    pub const PEDESTRIAN: VehicleMask = VehicleMask(1 << 0);
    pub const BICYCLE: VehicleMask = VehicleMask(1 << 1);
    pub const CAR: VehicleMask = VehicleMask(1 << 2);
    pub const ALL: VehicleMask = VehicleMask(0b111);

    /// Returns `None` when bits outside the known vehicle types are set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits & !Self::ALL.0 == 0).then_some(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: VehicleMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, vehicle: VehicleType) -> bool {
        self.intersects(vehicle.mask())
    }
}

impl BitOr for VehicleMask {
    type Output = VehicleMask;

    fn bitor(self, rhs: Self) -> Self {
        VehicleMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for VehicleMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for VehicleMask {
    type Output = VehicleMask;

    fn bitand(self, rhs: Self) -> Self {
        VehicleMask(self.0 & rhs.0)
    }
}

impl fmt::Display for VehicleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = VehicleType::all()
            .iter()
            .filter(|v| self.contains(**v))
            .map(|v| v.name())
            .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Computes road and one-way masks from the country's vehicle models.
pub struct VehicleMaskBuilder {
    models: [Arc<dyn VehicleModel>; VehicleType::COUNT],
}

impl VehicleMaskBuilder {
    /// Fails if any of the country's vehicle models is missing; masks cannot be
    /// computed without all three.
    pub fn new(country: &str, factory: &dyn VehicleModelFactory) -> Result<Self> {
        Ok(Self {
            models: [
                load_model(country, VehicleType::Pedestrian, factory)?,
                load_model(country, VehicleType::Bicycle, factory)?,
                load_model(country, VehicleType::Car, factory)?,
            ],
        })
    }

    pub fn model(&self, vehicle: VehicleType) -> &Arc<dyn VehicleModel> {
        &self.models[vehicle.index()]
    }

    pub fn calc_road_mask(&self, feature: &Feature) -> VehicleMask {
        self.calc_mask(|model| model.is_road(feature))
    }

    pub fn calc_one_way_mask(&self, feature: &Feature) -> VehicleMask {
        self.calc_mask(|model| model.is_one_way(feature))
    }

    fn calc_mask(&self, pred: impl Fn(&dyn VehicleModel) -> bool) -> VehicleMask {
        let mut mask = VehicleMask::NONE;
        for &vehicle in VehicleType::all() {
            if pred(self.models[vehicle.index()].as_ref()) {
                mask |= vehicle.mask();
            }
        }
        mask
    }
}

pub(crate) fn load_model(
    country: &str,
    vehicle: VehicleType,
    factory: &dyn VehicleModelFactory,
) -> Result<Arc<dyn VehicleModel>> {
    factory
        .model_for_country(country, vehicle)
        .ok_or_else(|| Error::ModelUnavailable {
            country: country.to_string(),
            vehicle: vehicle.name().to_string(),
            suggestion: suggest_correction(country, factory.known_countries()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointD;
    use crate::profiles::ProfileRegistry;

    fn road(highway: &str) -> Feature {
        Feature::new(1, vec![PointD::new(0.0, 0.0), PointD::new(0.001, 0.0)])
            .with_tag("highway", highway)
    }

    #[test]
    fn test_road_mask_by_highway_class() {
        let registry = ProfileRegistry::with_defaults();
        let builder = VehicleMaskBuilder::new("Belgium", &registry).unwrap();

        assert_eq!(builder.calc_road_mask(&road("residential")), VehicleMask::ALL);
        assert_eq!(builder.calc_road_mask(&road("motorway")), VehicleMask::CAR);
        assert_eq!(
            builder.calc_road_mask(&road("footway")),
            VehicleMask::PEDESTRIAN
        );
        assert_eq!(builder.calc_road_mask(&road("construction")), VehicleMask::NONE);
        assert_eq!(
            builder.calc_road_mask(&Feature::new(2, vec![])),
            VehicleMask::NONE
        );
    }

    #[test]
    fn test_one_way_mask() {
        let registry = ProfileRegistry::with_defaults();
        let builder = VehicleMaskBuilder::new("Belgium", &registry).unwrap();

        let oneway = road("residential").with_tag("oneway", "yes");
        let mask = builder.calc_one_way_mask(&oneway);
        assert!(mask.contains(VehicleType::Car));
        assert!(mask.contains(VehicleType::Bicycle));
        assert!(!mask.contains(VehicleType::Pedestrian));

        let contraflow = oneway.with_tag("oneway:bicycle", "no");
        assert_eq!(builder.calc_one_way_mask(&contraflow), VehicleMask::CAR);

        assert_eq!(builder.calc_one_way_mask(&road("motorway")), VehicleMask::CAR);
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let registry = ProfileRegistry::new();
        let err = VehicleMaskBuilder::new("Belgium", &registry).err().unwrap();
        assert!(matches!(err, Error::ModelUnavailable { .. }));
    }

    #[test]
    fn test_mask_bits_and_display() {
        let mask = VehicleMask::CAR | VehicleMask::PEDESTRIAN;
        assert_eq!(mask.bits(), 0b101);
        assert_eq!(mask.to_string(), "pedestrian|car");
        assert_eq!(VehicleMask::NONE.to_string(), "none");
        assert_eq!(VehicleMask::from_bits(0b1000), None);
        assert_eq!((mask & VehicleMask::BICYCLE), VehicleMask::NONE);
        assert_eq!(VehicleType::Bicycle.mask(), VehicleMask::BICYCLE);
    }
}
