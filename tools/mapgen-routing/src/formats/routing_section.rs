//! `routing` section: per-feature vehicle masks and the joint index
//!
//! Body (varints unless noted):
//!
//! ```text
//!   mask_count
//!   mask_count × { feature_id_delta, mask: u8 }   // ascending feature ids
//!   joint_count
//!   joint_count × { point_count, point_count × { feature_id, point_idx } }
//! ```

use mapgen_common::{Error, Result};
use std::collections::BTreeMap;

use super::codec::{open_sealed, write_sealed, write_varint, Reader};
use super::container::RegionContainer;
use crate::feature::FeatureId;
use crate::index_graph::{IndexGraph, Joint, RoadPoint};
use crate::vehicle_mask::VehicleMask;

pub const ROUTING_FILE_TAG: &str = "routing";

const MAGIC: u32 = 0x5452_474D; // "MGRT"
const VERSION: u16 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingSection {
    pub masks: BTreeMap<FeatureId, VehicleMask>,
    pub joints: Vec<Joint>,
}

impl RoutingSection {
    pub fn new(masks: BTreeMap<FeatureId, VehicleMask>, joints: Vec<Joint>) -> Self {
        Self { masks, joints }
    }

    pub fn num_points(&self) -> usize {
        self.joints.iter().map(Joint::size).sum()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();

        write_varint(&mut body, self.masks.len() as u64);
        let mut prev = 0u32;
        for (&FeatureId(id), mask) in &self.masks {
            write_varint(&mut body, u64::from(id - prev));
            body.push(mask.bits());
            prev = id;
        }

        write_varint(&mut body, self.joints.len() as u64);
        for joint in &self.joints {
            write_varint(&mut body, joint.size() as u64);
            for rp in joint.points() {
                write_varint(&mut body, u64::from(rp.feature_id.0));
                write_varint(&mut body, u64::from(rp.point_idx));
            }
        }
        body
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new(body, "routing section");

        let mask_count = r.count()?;
        let mut masks = BTreeMap::new();
        let mut id = 0u32;
        for i in 0..mask_count {
            let delta = r.varint_u32()?;
            if i > 0 && delta == 0 {
                return Err(Error::corrupt("routing section: duplicate feature id"));
            }
            id = id
                .checked_add(delta)
                .ok_or_else(|| Error::corrupt("routing section: feature id overflow"))?;
            let bits = r.u8()?;
            let mask = VehicleMask::from_bits(bits)
                .ok_or_else(|| Error::corrupt(format!("routing section: bad mask 0x{bits:02x}")))?;
            masks.insert(FeatureId(id), mask);
        }

        let joint_count = r.count()?;
        let mut joints = Vec::with_capacity(joint_count);
        for _ in 0..joint_count {
            let point_count = r.count()?;
            let mut points = Vec::with_capacity(point_count);
            for _ in 0..point_count {
                let feature_id = FeatureId(r.varint_u32()?);
                points.push(RoadPoint::new(feature_id, r.varint_u32()?));
            }
            joints.push(Joint::new(points));
        }

        r.finish()?;
        Ok(Self { masks, joints })
    }

    pub fn write(&self, container: &mut RegionContainer) -> Result<u64> {
        let body = self.encode();
        container.write_section(ROUTING_FILE_TAG, |w| Ok(write_sealed(w, MAGIC, VERSION, &body)?))
    }

    pub fn load(container: &mut RegionContainer) -> Result<Self> {
        let data = container.read_section(ROUTING_FILE_TAG)?;
        Self::decode(open_sealed(&data, ROUTING_FILE_TAG, MAGIC, VERSION)?)
    }

    /// Installs the stored joints into `graph`.
    pub fn import_into(self, graph: &mut IndexGraph) {
        graph.import(self.joints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoutingSection {
        let mut masks = BTreeMap::new();
        masks.insert(FeatureId(3), VehicleMask::ALL);
        masks.insert(FeatureId(10), VehicleMask::CAR);
        masks.insert(FeatureId(11), VehicleMask::PEDESTRIAN | VehicleMask::BICYCLE);
        let joints = vec![
            Joint::new(vec![RoadPoint::new(FeatureId(3), 0), RoadPoint::new(FeatureId(10), 4)]),
            Joint::new(vec![
                RoadPoint::new(FeatureId(3), 7),
                RoadPoint::new(FeatureId(10), 0),
                RoadPoint::new(FeatureId(11), 2),
            ]),
        ];
        RoutingSection::new(masks, joints)
    }

    #[test]
    fn test_section_round_trip_through_container() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut container = RegionContainer::create(dir.path().join("r.mwm")).unwrap();
        let section = sample();
        section.write(&mut container).unwrap();

        let loaded = RoutingSection::load(&mut container).unwrap();
        assert_eq!(loaded, section);
        assert_eq!(loaded.num_points(), 5);

        let mut graph = IndexGraph::default();
        loaded.import_into(&mut graph);
        assert_eq!(graph.num_joints(), 2);
        assert_eq!(graph.joint_id(RoadPoint::new(FeatureId(11), 2)), Some(1));
    }

    #[test]
    fn test_decode_rejects_bad_mask_and_trailing_bytes() {
        let mut body = Vec::new();
        write_varint(&mut body, 1);
        write_varint(&mut body, 5);
        body.push(0xf0);
        write_varint(&mut body, 0);
        assert!(RoutingSection::decode(&body).is_err());

        let mut body = sample().encode();
        body.push(0);
        assert!(RoutingSection::decode(&body).is_err());
    }

    #[test]
    fn test_empty_section() {
        let empty = RoutingSection::default();
        assert_eq!(RoutingSection::decode(&empty.encode()).unwrap(), empty);
    }
}
