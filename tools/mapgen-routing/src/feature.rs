//! Road features and the sequential feature stream of a region

use mapgen_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::geometry::PointD;

/// Stable index of a feature within its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u32);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only input feature: ordered geometry plus tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub points: Vec<PointD>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Feature {
    pub fn new(id: u32, points: Vec<PointD>) -> Self {
        Self {
            id: FeatureId(id),
            points,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn points_count(&self) -> usize {
        self.points.len()
    }
}

/// Sequential feature stream of one region.
pub trait FeatureSource {
    fn for_each_feature(&self, f: &mut dyn FnMut(&Feature)) -> Result<()>;
}

impl FeatureSource for [Feature] {
    fn for_each_feature(&self, f: &mut dyn FnMut(&Feature)) -> Result<()> {
        for feature in self {
            f(feature);
        }
        Ok(())
    }
}

impl FeatureSource for Vec<Feature> {
    fn for_each_feature(&self, f: &mut dyn FnMut(&Feature)) -> Result<()> {
        self.as_slice().for_each_feature(f)
    }
}

/// JSON-lines feature dump, one [`Feature`] object per line.
///
/// The file is re-read on every pass, so building the routing and cross-mwm
/// sections never holds the whole region in memory.
pub struct FeatureFile {
    path: PathBuf,
}

impl FeatureFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSource for FeatureFile {
    fn for_each_feature(&self, f: &mut dyn FnMut(&Feature)) -> Result<()> {
        let reader = BufReader::new(File::open(&self.path)?);
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let feature: Feature = serde_json::from_str(&line).map_err(|e| {
                Error::invalid_input(format!(
                    "{}:{}: bad feature record: {e}",
                    self.path.display(),
                    line_no + 1
                ))
            })?;
            f(&feature);
        }
        Ok(())
    }
}
