//! Region data header: coordinate coding parameters shared by all sections

use mapgen_common::{Error, Result};

use super::codec::{open_sealed, write_sealed, write_varint, zigzag_decode, zigzag_encode, Reader};
use super::container::RegionContainer;
use crate::geometry::{PointD, PointU};

pub const HEADER_FILE_TAG: &str = "header";

const MAGIC: u32 = 0x4448_474D; // "MGHD"
const VERSION: u16 = 1;

/// Fixed-point precision and origin used to store coordinates compactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParams {
    coord_bits: u8,
    base_point: PointU,
}

impl CodingParams {
    pub fn new(coord_bits: u8, base_point: PointD) -> Result<Self> {
        check_coord_bits(coord_bits)?;
        Ok(Self {
            coord_bits,
            base_point: PointU::from_point(base_point, coord_bits),
        })
    }

    pub fn coord_bits(&self) -> u8 {
        self.coord_bits
    }

    pub fn base_point(&self) -> PointD {
        self.base_point.to_point(self.coord_bits)
    }

    /// Appends `p` as zig-zag varint deltas from the base point.
    pub fn encode_point(&self, p: PointD, out: &mut Vec<u8>) {
        let pu = PointU::from_point(p, self.coord_bits);
        write_varint(out, zigzag_encode(i64::from(pu.x) - i64::from(self.base_point.x)));
        write_varint(out, zigzag_encode(i64::from(pu.y) - i64::from(self.base_point.y)));
    }

    pub fn decode_point(&self, reader: &mut Reader<'_>) -> Result<PointD> {
        let x = self.decode_axis(self.base_point.x, reader.varint()?)?;
        let y = self.decode_axis(self.base_point.y, reader.varint()?)?;
        Ok(PointU { x, y }.to_point(self.coord_bits))
    }

    fn decode_axis(&self, base: u32, delta: u64) -> Result<u32> {
        let value = i64::from(base) + zigzag_decode(delta);
        let max = (1i64 << self.coord_bits) - 1;
        if !(0..=max).contains(&value) {
            return Err(Error::corrupt(format!(
                "coordinate {value} outside the {}-bit grid",
                self.coord_bits
            )));
        }
        Ok(value as u32)
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.coord_bits);
        write_varint(out, u64::from(self.base_point.x));
        write_varint(out, u64::from(self.base_point.y));
    }

    pub(crate) fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        let coord_bits = reader.u8()?;
        check_coord_bits(coord_bits)
            .map_err(|_| Error::corrupt(format!("stored coord_bits {coord_bits} out of range")))?;
        let base_point = PointU {
            x: reader.varint_u32()?,
            y: reader.varint_u32()?,
        };
        Ok(Self {
            coord_bits,
            base_point,
        })
    }
}

fn check_coord_bits(coord_bits: u8) -> Result<()> {
    if (1..=32).contains(&coord_bits) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "coord_bits must be within 1..=32, got {coord_bits}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub coding_params: CodingParams,
}

impl DataHeader {
    pub fn new(coding_params: CodingParams) -> Self {
        Self { coding_params }
    }

    pub fn write(&self, container: &mut RegionContainer) -> Result<u64> {
        let mut body = Vec::new();
        self.coding_params.write_to(&mut body);
        container.write_section(HEADER_FILE_TAG, |w| Ok(write_sealed(w, MAGIC, VERSION, &body)?))
    }

    pub fn load(container: &mut RegionContainer) -> Result<Self> {
        let data = container.read_section(HEADER_FILE_TAG)?;
        let body = open_sealed(&data, HEADER_FILE_TAG, MAGIC, VERSION)?;
        let mut reader = Reader::new(body, "header section");
        let coding_params = CodingParams::read_from(&mut reader)?;
        reader.finish()?;
        Ok(Self { coding_params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{almost_equal_abs, POINT_COORD_BITS};

    #[test]
    fn test_point_coding_close_to_base_is_small() {
        let params = CodingParams::new(POINT_COORD_BITS, PointD::new(4.35, 50.85)).unwrap();
        let p = PointD::new(4.351, 50.851);

        let mut buf = Vec::new();
        params.encode_point(p, &mut buf);
        assert!(buf.len() <= 8, "{} bytes", buf.len());

        let decoded = params.decode_point(&mut Reader::new(&buf, "test")).unwrap();
        assert!(almost_equal_abs(decoded, p, 1e-6));
    }

    #[test]
    fn test_coord_bits_validated() {
        assert!(CodingParams::new(0, PointD::default()).is_err());
        assert!(CodingParams::new(33, PointD::default()).is_err());
        assert!(CodingParams::new(32, PointD::new(-180.0, 180.0)).is_ok());
    }

    #[test]
    fn test_decode_outside_grid_is_corrupt() {
        let params = CodingParams::new(8, PointD::new(179.0, 179.0)).unwrap();
        let mut buf = Vec::new();
        write_varint(&mut buf, zigzag_encode(10_000));
        write_varint(&mut buf, 0);
        assert!(params.decode_point(&mut Reader::new(&buf, "test")).is_err());
    }

    #[test]
    fn test_header_section() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut container = RegionContainer::create(dir.path().join("r.mwm")).unwrap();
        let header = DataHeader::new(CodingParams::new(24, PointD::new(2.0, 49.0)).unwrap());
        header.write(&mut container).unwrap();
        assert_eq!(DataHeader::load(&mut container).unwrap(), header);
    }
}
