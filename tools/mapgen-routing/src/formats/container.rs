//! Region container: one file holding named byte-range sections
//!
//! Layout (little-endian):
//!
//! ```text
//!   magic:     u32 = 0x5443474D  // "MGCT"
//!   version:   u16 = 1
//!   reserved:  u16
//!   sections:  [u8]...           // appended back to back
//!   toc:       n × { name_len: u16, name: [u8], offset: u64, size: u64, crc64: u64 }
//!   footer:    toc_offset: u64, n: u32, magic: u32
//! ```
//!
//! The table of contents is rewritten after every section write. New sections
//! start where the previous table of contents began.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use mapgen_common::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::crc::{checksum, DigestWriter};

const MAGIC: u32 = 0x5443_474D; // "MGCT"
const VERSION: u16 = 1;
const DATA_START: u64 = 8;
const FOOTER_SIZE: u64 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
    pub crc64: u64,
}

#[derive(Debug)]
pub struct RegionContainer {
    path: PathBuf,
    file: File,
    sections: Vec<SectionEntry>,
    cursor: u64,
}

impl RegionContainer {
    /// Creates (or truncates) an empty container.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.write_u32::<LittleEndian>(MAGIC)?;
        file.write_u16::<LittleEndian>(VERSION)?;
        file.write_u16::<LittleEndian>(0)?;

        let mut container = Self {
            path,
            file,
            sections: Vec::new(),
            cursor: DATA_START,
        };
        container.write_toc()?;
        Ok(container)
    }

    /// Opens an existing container for reading and appending sections.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len < DATA_START + FOOTER_SIZE {
            return Err(Error::corrupt(format!(
                "{}: {len} bytes is too short for a region container",
                path.display()
            )));
        }

        let magic = file.read_u32::<LittleEndian>()?;
        let version = file.read_u16::<LittleEndian>()?;
        if magic != MAGIC || version != VERSION {
            return Err(Error::corrupt(format!(
                "{}: not a region container (magic 0x{magic:08x}, version {version})",
                path.display()
            )));
        }

        file.seek(SeekFrom::Start(len - FOOTER_SIZE))?;
        let toc_offset = file.read_u64::<LittleEndian>()?;
        let n = file.read_u32::<LittleEndian>()?;
        if file.read_u32::<LittleEndian>()? != MAGIC || toc_offset < DATA_START || toc_offset > len - FOOTER_SIZE {
            return Err(Error::corrupt(format!("{}: bad container footer", path.display())));
        }

        file.seek(SeekFrom::Start(toc_offset))?;
        let mut sections = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let name_len = file.read_u16::<LittleEndian>()?;
            let mut name = vec![0u8; usize::from(name_len)];
            file.read_exact(&mut name)?;
            let name = String::from_utf8(name).map_err(|_| {
                Error::corrupt(format!("{}: section name is not UTF-8", path.display()))
            })?;
            let offset = file.read_u64::<LittleEndian>()?;
            let size = file.read_u64::<LittleEndian>()?;
            let crc64 = file.read_u64::<LittleEndian>()?;
            if offset.checked_add(size).map_or(true, |end| end > toc_offset) {
                return Err(Error::corrupt(format!(
                    "{}: section '{name}' lies outside the data area",
                    path.display()
                )));
            }
            sections.push(SectionEntry {
                name,
                offset,
                size,
                crc64,
            });
        }

        Ok(Self {
            path,
            file,
            sections,
            cursor: toc_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Appends a section at the write cursor.
    ///
    /// The section size is the distance the cursor moved while `write` ran.
    /// An existing section with the same name is superseded. Any failure is
    /// reported as [`Error::Section`]; the container then keeps its previous
    /// sections and table of contents.
    pub fn write_section<F>(&mut self, name: &str, write: F) -> Result<u64>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let section_err = |message: String| Error::Section {
            name: name.to_string(),
            message,
        };
        if name.is_empty() || name.len() > usize::from(u16::MAX) {
            return Err(section_err(format!("invalid section name length {}", name.len())));
        }

        let start = self.cursor;
        let (end, crc64) = match self.append_at_cursor(write) {
            Ok(written) => written,
            Err(e) => {
                // The cursor is unchanged, so this puts the previous table
                // back over the partial bytes and truncates the rest
                if let Err(restore) = self.write_toc() {
                    warn!(section = name, error = %restore, "Failed to restore table of contents");
                }
                return Err(section_err(e.to_string()));
            }
        };
        let entry = SectionEntry {
            name: name.to_string(),
            offset: start,
            size: end - start,
            crc64,
        };
        debug!(section = name, offset = start, size = entry.size, "Section written");

        self.sections.retain(|s| s.name != name);
        self.sections.push(entry);
        self.cursor = end;
        self.write_toc().map_err(|e| section_err(e.to_string()))?;
        Ok(end - start)
    }

    /// Reads a whole section and verifies its checksum.
    pub fn read_section(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .section(name)
            .cloned()
            .ok_or_else(|| Error::SectionNotFound(name.to_string()))?;

        let size = usize::try_from(entry.size)
            .map_err(|_| Error::corrupt(format!("section '{name}' is too large")))?;
        let mut data = vec![0u8; size];
        self.file.seek(SeekFrom::Start(entry.offset))?;
        self.file.read_exact(&mut data)?;

        if checksum(&data) != entry.crc64 {
            return Err(Error::corrupt(format!(
                "section '{name}' in {} fails its checksum",
                self.path.display()
            )));
        }
        Ok(data)
    }

    fn append_at_cursor<F>(&mut self, write: F) -> Result<(u64, u64)>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        self.file.seek(SeekFrom::Start(self.cursor))?;
        let crc64 = {
            let mut writer = DigestWriter::new(BufWriter::new(&mut self.file));
            write(&mut writer)?;
            writer.flush()?;
            let (_, crc64) = writer.into_parts();
            crc64
        };
        Ok((self.file.stream_position()?, crc64))
    }

    fn write_toc(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.cursor))?;
        let mut w = BufWriter::new(&mut self.file);
        for s in &self.sections {
            w.write_u16::<LittleEndian>(s.name.len() as u16)?;
            w.write_all(s.name.as_bytes())?;
            w.write_u64::<LittleEndian>(s.offset)?;
            w.write_u64::<LittleEndian>(s.size)?;
            w.write_u64::<LittleEndian>(s.crc64)?;
        }
        w.write_u64::<LittleEndian>(self.cursor)?;
        w.write_u32::<LittleEndian>(self.sections.len() as u32)?;
        w.write_u32::<LittleEndian>(MAGIC)?;
        w.flush()?;
        drop(w);

        let end = self.file.stream_position()?;
        self.file.set_len(end)?;
        self.file.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_bytes(container: &mut RegionContainer, name: &str, bytes: &'static [u8]) -> u64 {
        container
            .write_section(name, |w| Ok(w.write_all(bytes)?))
            .unwrap()
    }

    #[test]
    fn test_sections_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Testland.mwm");

        let mut container = RegionContainer::create(&path).unwrap();
        assert_eq!(write_bytes(&mut container, "header", b"abc"), 3);
        assert_eq!(write_bytes(&mut container, "routing", b"defgh"), 5);
        drop(container);

        let mut container = RegionContainer::open_existing(&path).unwrap();
        let names: Vec<_> = container.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["header", "routing"]);
        assert_eq!(container.section("routing").unwrap().offset, DATA_START + 3);
        assert_eq!(container.read_section("header").unwrap(), b"abc");
        assert_eq!(container.read_section("routing").unwrap(), b"defgh");
    }

    #[test]
    fn test_rewriting_a_section_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.mwm");
        let mut container = RegionContainer::create(&path).unwrap();
        write_bytes(&mut container, "routing", b"old");
        write_bytes(&mut container, "routing", b"newer");

        let mut container = RegionContainer::open_existing(&path).unwrap();
        assert_eq!(container.sections().len(), 1);
        assert_eq!(container.read_section("routing").unwrap(), b"newer");
    }

    #[test]
    fn test_missing_section_and_file() {
        let dir = TempDir::new().unwrap();
        let mut container = RegionContainer::create(dir.path().join("r.mwm")).unwrap();
        assert!(matches!(
            container.read_section("cross_mwm"),
            Err(Error::SectionNotFound(name)) if name == "cross_mwm"
        ));
        assert!(matches!(
            RegionContainer::open_existing(dir.path().join("absent.mwm")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_failed_writer_reports_section_name() {
        let dir = TempDir::new().unwrap();
        let mut container = RegionContainer::create(dir.path().join("r.mwm")).unwrap();
        let err = container
            .write_section("routing", |_| Err(Error::invalid_input("boom")))
            .unwrap_err();
        match err {
            Error::Section { name, message } => {
                assert_eq!(name, "routing");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_failed_writer_keeps_earlier_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.mwm");
        let mut container = RegionContainer::create(&path).unwrap();
        write_bytes(&mut container, "header", b"hdr");

        let err = container
            .write_section("cross_mwm", |w| {
                w.write_all(&[0xAB; 64])?;
                Err(Error::invalid_input("interrupted"))
            })
            .unwrap_err();
        assert!(matches!(err, Error::Section { ref name, .. } if name == "cross_mwm"));
        assert!(!container.has_section("cross_mwm"));
        write_bytes(&mut container, "routing", b"rt");
        drop(container);

        let mut container = RegionContainer::open_existing(&path).unwrap();
        let names: Vec<_> = container.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["header", "routing"]);
        assert_eq!(container.read_section("header").unwrap(), b"hdr");
        assert_eq!(container.read_section("routing").unwrap(), b"rt");
        assert_eq!(container.section("routing").unwrap().offset, DATA_START + 3);
    }

    #[test]
    fn test_corruption_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.mwm");
        let mut container = RegionContainer::create(&path).unwrap();
        write_bytes(&mut container, "routing", b"payload");
        drop(container);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[DATA_START as usize] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();
        let mut container = RegionContainer::open_existing(&path).unwrap();
        assert!(matches!(container.read_section("routing"), Err(Error::Corrupt(_))));

        std::fs::write(&path, b"not a container at all").unwrap();
        assert!(RegionContainer::open_existing(&path).is_err());
    }
}
