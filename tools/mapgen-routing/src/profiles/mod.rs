//! Built-in vehicle models for the different travel modes
//!
//! Each model implements tag semantics for access, direction and speed.
//! Models are plain values handed to the generator through a
//! [`VehicleModelFactory`]; there is no process-wide registry.

pub mod bike;
pub mod car;
pub mod foot;

pub use bike::BicycleModel;
pub use car::CarModel;
pub use foot::PedestrianModel;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::feature::Feature;
use crate::vehicle_mask::VehicleType;

/// Traversability and speed rules for one vehicle type.
pub trait VehicleModel: Send + Sync {
    fn is_road(&self, feature: &Feature) -> bool;

    fn is_one_way(&self, feature: &Feature) -> bool;

    /// Speed on this feature in km/h; 0 for non-roads.
    fn speed_kmph(&self, feature: &Feature) -> f64;

    fn max_speed_kmph(&self) -> f64;
}

/// Supplies vehicle models per country.
pub trait VehicleModelFactory {
    fn model_for_country(&self, country: &str, vehicle: VehicleType)
        -> Option<Arc<dyn VehicleModel>>;

    /// Countries with explicit models, used for "did you mean" hints.
    fn known_countries(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Models for all three vehicle types.
#[derive(Clone)]
pub struct ProfileSet {
    pub pedestrian: Arc<dyn VehicleModel>,
    pub bicycle: Arc<dyn VehicleModel>,
    pub car: Arc<dyn VehicleModel>,
}

impl ProfileSet {
    pub fn builtin() -> Self {
        Self {
            pedestrian: Arc::new(PedestrianModel),
            bicycle: Arc::new(BicycleModel),
            car: Arc::new(CarModel::default()),
        }
    }

    pub fn get(&self, vehicle: VehicleType) -> Arc<dyn VehicleModel> {
        match vehicle {
            VehicleType::Pedestrian => Arc::clone(&self.pedestrian),
            VehicleType::Bicycle => Arc::clone(&self.bicycle),
            VehicleType::Car => Arc::clone(&self.car),
        }
    }
}

/// Country → models table with an optional fallback for unlisted countries.
#[derive(Clone, Default)]
pub struct ProfileRegistry {
    countries: BTreeMap<String, ProfileSet>,
    fallback: Option<ProfileSet>,
}

impl ProfileRegistry {
    /// Empty registry: every lookup fails until countries are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in models for every country.
    pub fn with_defaults() -> Self {
        Self {
            countries: BTreeMap::new(),
            fallback: Some(ProfileSet::builtin()),
        }
    }

    pub fn register(&mut self, country: &str, profiles: ProfileSet) -> &mut Self {
        self.countries.insert(country.to_string(), profiles);
        self
    }
}

impl VehicleModelFactory for ProfileRegistry {
    fn model_for_country(
        &self,
        country: &str,
        vehicle: VehicleType,
    ) -> Option<Arc<dyn VehicleModel>> {
        self.countries
            .get(country)
            .or(self.fallback.as_ref())
            .map(|set| set.get(vehicle))
    }

    fn known_countries(&self) -> Vec<String> {
        self.countries.keys().cloned().collect()
    }
}

/// `no` and `private` deny access; `destination` is allowed.
pub(crate) fn is_denied(value: Option<&str>) -> bool {
    matches!(value, Some("no") | Some("private"))
}

pub(crate) fn is_yes(value: Option<&str>) -> bool {
    matches!(value, Some("yes") | Some("1") | Some("true"))
}

/// Explicit `oneway=*` tag. `oneway=-1` ways are reversed by the feature
/// generator, so only forward one-ways reach the models.
pub(crate) fn tagged_one_way(feature: &Feature) -> bool {
    is_yes(feature.tag("oneway"))
}
