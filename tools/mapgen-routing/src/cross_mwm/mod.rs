//! Cross-region connectivity: border transitions, per-vehicle connectors and
//! leap weights between a region's enters and exits.

pub mod connector;
pub mod leaps;
pub mod transition;

pub use connector::{CrossMwmConnector, NO_ROUTE};
pub use leaps::LeapWeightComputer;
pub use transition::{calc_cross_mwm_transitions, BorderTransitionDetector, Transition};

use crate::vehicle_mask::VehicleType;

/// One connector per [`VehicleType`], indexed by [`VehicleType::index`].
#[derive(Debug, Clone, Default)]
pub struct ConnectorsPerVehicle {
    connectors: [CrossMwmConnector; VehicleType::COUNT],
}

impl ConnectorsPerVehicle {
    pub fn get(&self, vehicle: VehicleType) -> &CrossMwmConnector {
        &self.connectors[vehicle.index()]
    }

    pub fn get_mut(&mut self, vehicle: VehicleType) -> &mut CrossMwmConnector {
        &mut self.connectors[vehicle.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (VehicleType, &CrossMwmConnector)> {
        VehicleType::all().iter().map(|&v| (v, self.get(v)))
    }
}
