//! CRC-64 checksums for sections and the container table of contents

use crc::{Crc, CRC_64_GO_ISO};
use std::io::{self, Write};

pub const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

pub fn checksum(data: &[u8]) -> u64 {
    CRC64.checksum(data)
}

/// Incremental CRC-64 digest
pub struct Digest {
    digest: crc::Digest<'static, u64>,
}

impl Digest {
    pub fn new() -> Self {
        Self {
            digest: CRC64.digest(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    pub fn finalize(self) -> u64 {
        self.digest.finalize()
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer that checksums everything passing through it.
pub struct DigestWriter<W: Write> {
    inner: W,
    digest: Digest,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            digest: Digest::new(),
        }
    }

    pub fn into_parts(self) -> (W, u64) {
        (self.inner, self.digest.finalize())
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc64_incremental() {
        let data = b"routing section";
        let mut digest = Digest::new();
        digest.update(&data[..7]);
        digest.update(&data[7..]);
        assert_eq!(digest.finalize(), checksum(data));
    }

    #[test]
    fn test_digest_writer_matches_checksum() {
        let mut writer = DigestWriter::new(Vec::new());
        writer.write_all(b"cross").unwrap();
        writer.write_all(b"_mwm").unwrap();
        let (bytes, crc) = writer.into_parts();
        assert_eq!(bytes, b"cross_mwm");
        assert_eq!(crc, checksum(b"cross_mwm"));
        assert_ne!(crc, 0);
    }
}
