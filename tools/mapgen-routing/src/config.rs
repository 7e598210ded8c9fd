//! Generator configuration, optionally loaded from TOML
//!
//! ```toml
//! coord_bits = 30
//! borders_dir = "borders"
//! borders_extension = ".poly"
//! leap_threads = 8
//! leap_progress_interval = 10
//! ```

use mapgen_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geometry::POINT_COORD_BITS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Quantization precision for new region headers.
    pub coord_bits: u8,
    /// Border polygons directory, relative to the data directory.
    pub borders_dir: PathBuf,
    pub borders_extension: String,
    /// Size of the leap sweep pool; the global rayon pool when unset.
    pub leap_threads: Option<usize>,
    /// Log leap progress every this many sweeps (0 disables).
    pub leap_progress_interval: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            coord_bits: POINT_COORD_BITS,
            borders_dir: PathBuf::from("borders"),
            borders_extension: ".poly".to_string(),
            leap_threads: None,
            leap_progress_interval: 10,
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_input(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::invalid_input(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_input(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.coord_bits) {
            return Err(Error::invalid_input(format!(
                "coord_bits must be within 1..=32, got {}",
                self.coord_bits
            )));
        }
        if self.leap_threads == Some(0) {
            return Err(Error::invalid_input("leap_threads must be greater than 0"));
        }
        Ok(())
    }

    /// `<data_dir>/<borders_dir>/<country><borders_extension>`
    pub fn borders_path(&self, data_dir: &Path, country: &str) -> PathBuf {
        data_dir
            .join(&self.borders_dir)
            .join(format!("{country}{}", self.borders_extension))
    }
}
