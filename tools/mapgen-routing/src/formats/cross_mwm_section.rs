//! `cross_mwm` section: border transitions and per-vehicle connectors
//!
//! Body (varints unless noted):
//!
//! ```text
//!   coding params            // coord_bits: u8, base x, base y
//!   transition_count
//!   transition_count × {
//!     feature_id, segment_idx, road_mask: u8, one_way_mask: u8,
//!     forward_is_enter: u8, back_point, front_point   // zig-zag deltas
//!   }
//!   3 × {                    // pedestrian, bicycle, car
//!     enter_count, enter_count × segment,
//!     exit_count, exit_count × segment,
//!     has_weights: u8,
//!     [enter_count × exit_count × weight]             // 0 = no route, w + 1
//!   }
//! ```
//!
//! A segment is `feature_id, segment_idx << 1 | forward`. On load the
//! connectors are rebuilt from the transitions and must match the stored
//! enter and exit lists.

use mapgen_common::{Error, Result};

use super::codec::{open_sealed, write_sealed, write_varint, Reader};
use super::container::RegionContainer;
use super::header::CodingParams;
use crate::cross_mwm::{ConnectorsPerVehicle, CrossMwmConnector, Transition, NO_ROUTE};
use crate::feature::FeatureId;
use crate::index_graph::{Segment, Weight};
use crate::vehicle_mask::{VehicleMask, VehicleType};

pub const CROSS_MWM_FILE_TAG: &str = "cross_mwm";

const MAGIC: u32 = 0x4d43_474D; // "MGCM"
const VERSION: u16 = 1;

#[derive(Debug, Clone)]
pub struct CrossMwmSection {
    pub coding_params: CodingParams,
    pub transitions: Vec<Transition>,
    pub connectors: ConnectorsPerVehicle,
}

impl CrossMwmSection {
    pub fn new(
        coding_params: CodingParams,
        transitions: Vec<Transition>,
        connectors: ConnectorsPerVehicle,
    ) -> Self {
        Self {
            coding_params,
            transitions,
            connectors,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        let params = &self.coding_params;
        params.write_to(&mut body);

        write_varint(&mut body, self.transitions.len() as u64);
        for t in &self.transitions {
            write_varint(&mut body, u64::from(t.feature_id.0));
            write_varint(&mut body, u64::from(t.segment_idx));
            body.push(t.road_mask.bits());
            body.push(t.one_way_mask.bits());
            body.push(u8::from(t.forward_is_enter));
            params.encode_point(t.back_point, &mut body);
            params.encode_point(t.front_point, &mut body);
        }

        for (_, connector) in self.connectors.iter() {
            encode_segments(&mut body, connector.enters());
            encode_segments(&mut body, connector.exits());
            body.push(u8::from(connector.has_weights()));
            if connector.has_weights() {
                for &w in connector.weights() {
                    write_varint(&mut body, if w == NO_ROUTE { 0 } else { u64::from(w) + 1 });
                }
            }
        }
        body
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new(body, "cross_mwm section");
        let coding_params = CodingParams::read_from(&mut r)?;

        let count = r.count()?;
        let mut transitions = Vec::with_capacity(count);
        for _ in 0..count {
            let feature_id = FeatureId(r.varint_u32()?);
            let segment_idx = r.varint_u32()?;
            let road_mask = read_mask(&mut r)?;
            let one_way_mask = read_mask(&mut r)?;
            let forward_is_enter = r.bool()?;
            let back_point = coding_params.decode_point(&mut r)?;
            let front_point = coding_params.decode_point(&mut r)?;
            transitions.push(Transition {
                feature_id,
                segment_idx,
                road_mask,
                one_way_mask,
                forward_is_enter,
                back_point,
                front_point,
            });
        }

        let mut connectors = ConnectorsPerVehicle::default();
        for &vehicle in VehicleType::all() {
            let connector = connectors.get_mut(vehicle);
            for t in &transitions {
                t.register(vehicle, connector);
            }

            let enters = decode_segments(&mut r)?;
            let exits = decode_segments(&mut r)?;
            if enters != connector.enters() || exits != connector.exits() {
                return Err(Error::corrupt(format!(
                    "cross_mwm section: {vehicle} connector does not match its transitions"
                )));
            }

            if r.bool()? {
                let n = enters.len() * exits.len();
                let mut weights = Vec::with_capacity(n);
                for _ in 0..n {
                    weights.push(decode_weight(r.varint()?)?);
                }
                if !connector.set_weights(weights) {
                    return Err(Error::corrupt(format!(
                        "cross_mwm section: {vehicle} weight table does not match connector shape"
                    )));
                }
            }
        }

        r.finish()?;
        Ok(Self {
            coding_params,
            transitions,
            connectors,
        })
    }

    pub fn write(&self, container: &mut RegionContainer) -> Result<u64> {
        let body = self.encode();
        container.write_section(CROSS_MWM_FILE_TAG, |w| Ok(write_sealed(w, MAGIC, VERSION, &body)?))
    }

    pub fn load(container: &mut RegionContainer) -> Result<Self> {
        let data = container.read_section(CROSS_MWM_FILE_TAG)?;
        Self::decode(open_sealed(&data, CROSS_MWM_FILE_TAG, MAGIC, VERSION)?)
    }

    pub fn connector(&self, vehicle: VehicleType) -> &CrossMwmConnector {
        self.connectors.get(vehicle)
    }
}

fn encode_segments(body: &mut Vec<u8>, segments: &[Segment]) {
    write_varint(body, segments.len() as u64);
    for s in segments {
        write_varint(body, u64::from(s.feature_id.0));
        write_varint(body, (u64::from(s.segment_idx) << 1) | u64::from(s.forward));
    }
}

fn decode_segments(r: &mut Reader<'_>) -> Result<Vec<Segment>> {
    let n = r.count()?;
    let mut segments = Vec::with_capacity(n);
    for _ in 0..n {
        let feature_id = FeatureId(r.varint_u32()?);
        let packed = r.varint()?;
        let segment_idx = u32::try_from(packed >> 1)
            .map_err(|_| Error::corrupt("cross_mwm section: segment index overflow"))?;
        segments.push(Segment::new(feature_id, segment_idx, packed & 1 == 1));
    }
    Ok(segments)
}

fn decode_weight(stored: u64) -> Result<Weight> {
    match stored {
        0 => Ok(NO_ROUTE),
        w if w <= u64::from(NO_ROUTE) => Ok((w - 1) as Weight),
        w => Err(Error::corrupt(format!("cross_mwm section: weight {w} out of range"))),
    }
}

fn read_mask(r: &mut Reader<'_>) -> Result<VehicleMask> {
    let bits = r.u8()?;
    VehicleMask::from_bits(bits)
        .ok_or_else(|| Error::corrupt(format!("cross_mwm section: bad mask 0x{bits:02x}")))
}
