//! CLI commands for mapgen-routing

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::feature::{FeatureFile, FeatureSource};
use crate::formats::{CrossMwmSection, DataHeader, RegionContainer, RoutingSection};
use crate::formats::{CROSS_MWM_FILE_TAG, HEADER_FILE_TAG, ROUTING_FILE_TAG};
use crate::generator::{build_cross_mwm_section, build_routing_index, init_region};
use crate::profiles::ProfileRegistry;
use crate::vehicle_mask::VehicleType;

#[derive(Parser)]
#[command(name = "mapgen-routing")]
#[command(about = "Routing index and cross-region section generator", long_about = None)]
pub struct Cli {
    /// Generator configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs and `info` output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a region container with a data header
    Init {
        /// Region container to create (overwritten if present)
        container: PathBuf,

        /// Features (JSON lines) used to centre the coordinate coding
        #[arg(long)]
        features: Option<PathBuf>,
    },

    /// Build the routing section of an existing region
    Routing {
        container: PathBuf,

        /// Country whose vehicle models apply
        #[arg(long)]
        country: String,

        /// Features (JSON lines)
        #[arg(long)]
        features: PathBuf,
    },

    /// Build the cross-mwm section of an existing region
    CrossMwm {
        container: PathBuf,

        #[arg(long)]
        country: String,

        #[arg(long)]
        features: PathBuf,

        /// Directory holding the borders directory
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
    },

    /// List the sections of a region container
    Info { container: PathBuf },
}

#[derive(Serialize)]
struct SectionInfo<'a> {
    name: &'a str,
    offset: u64,
    size: u64,
    crc64: String,
}

impl Cli {
    pub fn load_config(&self) -> Result<GeneratorConfig> {
        match &self.config {
            Some(path) => GeneratorConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => Ok(GeneratorConfig::default()),
        }
    }

    pub fn run(self) -> Result<()> {
        let config = self.load_config()?;
        let models = ProfileRegistry::with_defaults();

        match self.command {
            Commands::Init {
                container,
                features,
            } => {
                let features = features.map(FeatureFile::new);
                init_region(
                    &container,
                    features.as_ref().map(|f| f as &dyn FeatureSource),
                    &config,
                )
                .with_context(|| format!("Failed to create {}", container.display()))?;
                Ok(())
            }
            Commands::Routing {
                container,
                country,
                features,
            } => {
                let features = FeatureFile::new(features);
                if !build_routing_index(&container, &country, &features, &models, &config) {
                    bail!("{ROUTING_FILE_TAG} section failed for {country}");
                }
                Ok(())
            }
            Commands::CrossMwm {
                container,
                country,
                features,
                data_dir,
            } => {
                let features = FeatureFile::new(features);
                if !build_cross_mwm_section(&data_dir, &container, &country, &features, &models, &config) {
                    bail!("{CROSS_MWM_FILE_TAG} section failed for {country}");
                }
                Ok(())
            }
            Commands::Info { container } => print_info(&container, self.json),
        }
    }
}

fn print_info(path: &Path, json: bool) -> Result<()> {
    let mut container = RegionContainer::open_existing(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if json {
        let sections: Vec<SectionInfo> = container
            .sections()
            .iter()
            .map(|s| SectionInfo {
                name: &s.name,
                offset: s.offset,
                size: s.size,
                crc64: format!("{:016x}", s.crc64),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    println!("{}", path.display());
    for s in container.sections() {
        println!(
            "  {:<10} offset {:>10}  size {:>10}  crc64 {:016x}",
            s.name, s.offset, s.size, s.crc64
        );
    }

    if container.has_section(HEADER_FILE_TAG) {
        let header = DataHeader::load(&mut container)?;
        let params = header.coding_params;
        println!("  coding: {} bits, base {}", params.coord_bits(), params.base_point());
    }
    if container.has_section(ROUTING_FILE_TAG) {
        let routing = RoutingSection::load(&mut container)?;
        println!(
            "  routing: {} masks, {} joints, {} points",
            routing.masks.len(),
            routing.joints.len(),
            routing.num_points()
        );
    }
    if container.has_section(CROSS_MWM_FILE_TAG) {
        let cross = CrossMwmSection::load(&mut container)?;
        println!("  cross_mwm: {} transitions", cross.transitions.len());
        for &vehicle in VehicleType::all() {
            let c = cross.connector(vehicle);
            println!(
                "    {:<10} enters {:>6}  exits {:>6}  weights {}",
                vehicle.name(),
                c.enters().len(),
                c.exits().len(),
                if c.has_weights() { "yes" } else { "no" }
            );
        }
    }
    Ok(())
}
