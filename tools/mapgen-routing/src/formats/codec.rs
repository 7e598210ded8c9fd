//! Shared binary primitives: LEB128 varints, zig-zag and sealed sections
//!
//! A sealed section is laid out as:
//!
//! ```text
//!   magic:    u32 (LE)
//!   version:  u16 (LE)
//!   body:     [u8]
//!   crc64:    u64 (LE), over magic + version + body
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use mapgen_common::{Error, Result};
use std::io::{self, Write};

use super::crc::{checksum, DigestWriter};

const SEAL_HEADER_SIZE: usize = 6;
const SEAL_FOOTER_SIZE: usize = 8;

pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Writes `body` framed with magic, version and checksum.
pub fn write_sealed<W: Write + ?Sized>(w: &mut W, magic: u32, version: u16, body: &[u8]) -> io::Result<()> {
    let mut digest = DigestWriter::new(&mut *w);
    digest.write_u32::<LittleEndian>(magic)?;
    digest.write_u16::<LittleEndian>(version)?;
    digest.write_all(body)?;
    let (inner, crc) = digest.into_parts();
    inner.write_u64::<LittleEndian>(crc)
}

/// Validates the frame written by [`write_sealed`] and returns the body.
pub fn open_sealed<'a>(data: &'a [u8], what: &str, magic: u32, version: u16) -> Result<&'a [u8]> {
    if data.len() < SEAL_HEADER_SIZE + SEAL_FOOTER_SIZE {
        return Err(Error::corrupt(format!("{what}: {} bytes is too short", data.len())));
    }
    let (framed, mut footer) = data.split_at(data.len() - SEAL_FOOTER_SIZE);
    let mut header = framed;

    let found_magic = header.read_u32::<LittleEndian>()?;
    if found_magic != magic {
        return Err(Error::corrupt(format!(
            "{what}: invalid magic 0x{found_magic:08x}, expected 0x{magic:08x}"
        )));
    }
    let found_version = header.read_u16::<LittleEndian>()?;
    if found_version != version {
        return Err(Error::corrupt(format!(
            "{what}: unsupported version {found_version}, expected {version}"
        )));
    }

    let stored = footer.read_u64::<LittleEndian>()?;
    let actual = checksum(framed);
    if stored != actual {
        return Err(Error::corrupt(format!(
            "{what}: checksum mismatch (stored 0x{stored:016x}, computed 0x{actual:016x})"
        )));
    }
    Ok(header)
}

/// Cursor over a section body. Running out of bytes reads as corruption.
pub struct Reader<'a> {
    buf: &'a [u8],
    what: &'static str,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, what }
    }

    fn truncated(&self) -> Error {
        Error::corrupt(format!("{}: truncated", self.what))
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.buf.read_u8().map_err(|_| self.truncated())
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::corrupt(format!("{}: bad flag byte {other}", self.what))),
        }
    }

    pub fn varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::corrupt(format!("{}: varint too long", self.what)))
    }

    pub fn varint_u32(&mut self) -> Result<u32> {
        let value = self.varint()?;
        u32::try_from(value)
            .map_err(|_| Error::corrupt(format!("{}: value {value} overflows u32", self.what)))
    }

    /// Count prefix for a list whose items take at least one byte each.
    pub fn count(&mut self) -> Result<usize> {
        let n = self.varint()?;
        if n > self.buf.len() as u64 {
            return Err(Error::corrupt(format!(
                "{}: count {n} exceeds remaining {} bytes",
                self.what,
                self.buf.len()
            )));
        }
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(Error::corrupt(format!(
                "{}: {} trailing bytes",
                self.what,
                self.buf.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        for value in [0u64, 127, 128, 300, u64::from(u32::MAX), u64::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            let mut reader = Reader::new(&buf, "test");
            assert_eq!(reader.varint().unwrap(), value);
            reader.finish().unwrap();
        }
        let mut one = Vec::new();
        write_varint(&mut one, 127);
        assert_eq!(one, vec![0x7f]);
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_decode(zigzag_encode(i64::MIN)), i64::MIN);
        assert_eq!(zigzag_decode(zigzag_encode(-123_456)), -123_456);
    }

    #[test]
    fn test_truncated_varint_is_corrupt() {
        let mut reader = Reader::new(&[0x80, 0x80], "test");
        assert!(matches!(reader.varint(), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_count_larger_than_buffer() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 1_000);
        assert!(Reader::new(&buf, "test").count().is_err());
    }

    #[test]
    fn test_sealed_frame_checks() {
        let mut buf = Vec::new();
        write_sealed(&mut buf, 0xABCD_0001, 3, b"payload").unwrap();
        assert_eq!(open_sealed(&buf, "t", 0xABCD_0001, 3).unwrap(), b"payload");

        assert!(open_sealed(&buf, "t", 0xABCD_0002, 3).is_err());
        assert!(open_sealed(&buf, "t", 0xABCD_0001, 4).is_err());
        assert!(open_sealed(&buf[..5], "t", 0xABCD_0001, 3).is_err());

        let mut flipped = buf.clone();
        flipped[8] ^= 0xff;
        let err = open_sealed(&flipped, "t", 0xABCD_0001, 3).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }
}
