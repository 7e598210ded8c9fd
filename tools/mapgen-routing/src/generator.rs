//! Region-level entry points
//!
//! Each entry point runs one section build for one region, logs failures with
//! the section name and reports success as `bool` so a batch over many
//! regions keeps going. The `try_` variants return the underlying error.

use mapgen_common::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::borders::Borders;
use crate::config::GeneratorConfig;
use crate::cross_mwm::{calc_cross_mwm_transitions, LeapWeightComputer};
use crate::feature::FeatureSource;
use crate::formats::{
    CodingParams, CrossMwmSection, DataHeader, RegionContainer, RoutingSection,
    CROSS_MWM_FILE_TAG, ROUTING_FILE_TAG,
};
use crate::geometry::PointD;
use crate::index_graph::{EdgeEstimator, Geometry, IndexGraph};
use crate::processor::Processor;
use crate::profiles::VehicleModelFactory;
use crate::vehicle_mask::{load_model, VehicleMaskBuilder, VehicleType};

/// Counts reported after a routing section build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingStats {
    pub section_size: u64,
    pub num_roads: usize,
    pub num_joints: usize,
    pub num_points: usize,
}

/// Counts reported after a cross-mwm section build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossMwmStats {
    pub section_size: u64,
    pub num_transitions: usize,
    pub car_enters: usize,
    pub car_exits: usize,
}

/// Creates a region container holding only the data header.
///
/// The coding base point is the centre of the features' bounding box, or the
/// origin when no features are given.
pub fn init_region(
    container_path: &Path,
    features: Option<&dyn FeatureSource>,
    config: &GeneratorConfig,
) -> Result<DataHeader> {
    config.validate()?;
    let base_point = match features {
        Some(features) => bbox_center(features)?,
        None => PointD::default(),
    };
    let header = DataHeader::new(CodingParams::new(config.coord_bits, base_point)?);

    let mut container = RegionContainer::create(container_path)?;
    header.write(&mut container)?;
    info!(
        path = %container_path.display(),
        coord_bits = config.coord_bits,
        base = %base_point,
        "Region container created"
    );
    Ok(header)
}

fn bbox_center(features: &dyn FeatureSource) -> Result<PointD> {
    let mut min = PointD::new(f64::INFINITY, f64::INFINITY);
    let mut max = PointD::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    features.for_each_feature(&mut |f| {
        for p in &f.points {
            min = PointD::new(min.x.min(p.x), min.y.min(p.y));
            max = PointD::new(max.x.max(p.x), max.y.max(p.y));
        }
    })?;
    if min.x > max.x {
        return Ok(PointD::default());
    }
    Ok(PointD::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0))
}

/// Quantization precision of an existing region; falls back to the configured
/// one for containers without a header.
fn region_coord_bits(container: &mut RegionContainer, config: &GeneratorConfig) -> Result<u8> {
    match DataHeader::load(container) {
        Ok(header) => Ok(header.coding_params.coord_bits()),
        Err(Error::SectionNotFound(_)) => {
            warn!(
                path = %container.path().display(),
                coord_bits = config.coord_bits,
                "Region has no header, using configured precision"
            );
            Ok(config.coord_bits)
        }
        Err(e) => Err(e),
    }
}

pub fn build_routing_index(
    container_path: &Path,
    country: &str,
    features: &dyn FeatureSource,
    models: &dyn VehicleModelFactory,
    config: &GeneratorConfig,
) -> bool {
    match try_build_routing_index(container_path, country, features, models, config) {
        Ok(_) => true,
        Err(e) => {
            error!(section = ROUTING_FILE_TAG, country, error = %e, "Failed to create section");
            false
        }
    }
}

pub fn try_build_routing_index(
    container_path: &Path,
    country: &str,
    features: &dyn FeatureSource,
    models: &dyn VehicleModelFactory,
    config: &GeneratorConfig,
) -> Result<RoutingStats> {
    info!(path = %container_path.display(), country, "Building routing index");

    let mut container = RegionContainer::open_existing(container_path)?;
    let coord_bits = region_coord_bits(&mut container, config)?;

    let mask_builder = VehicleMaskBuilder::new(country, models)?;
    let mut processor = Processor::new(&mask_builder, coord_bits);
    processor.process_all_features(features)?;

    let mut graph = IndexGraph::default();
    processor.build_graph(&mut graph);

    let section = RoutingSection::new(processor.masks().clone(), graph.joints().to_vec());
    let section_size = section.write(&mut container)?;

    let stats = RoutingStats {
        section_size,
        num_roads: graph.num_roads(),
        num_joints: graph.num_joints(),
        num_points: graph.num_points(),
    };
    info!(
        bytes = stats.section_size,
        roads = stats.num_roads,
        joints = stats.num_joints,
        points = stats.num_points,
        "Routing section created"
    );
    Ok(stats)
}

pub fn build_cross_mwm_section(
    data_dir: &Path,
    container_path: &Path,
    country: &str,
    features: &dyn FeatureSource,
    models: &dyn VehicleModelFactory,
    config: &GeneratorConfig,
) -> bool {
    match try_build_cross_mwm_section(data_dir, container_path, country, features, models, config) {
        Ok(_) => true,
        Err(e) => {
            error!(section = CROSS_MWM_FILE_TAG, country, error = %e, "Failed to create section");
            false
        }
    }
}

pub fn try_build_cross_mwm_section(
    data_dir: &Path,
    container_path: &Path,
    country: &str,
    features: &dyn FeatureSource,
    models: &dyn VehicleModelFactory,
    config: &GeneratorConfig,
) -> Result<CrossMwmStats> {
    info!(country, "Building cross mwm section");
    let timer = Instant::now();

    let borders_path = config.borders_path(data_dir, country);
    let borders = Borders::load_poly(&borders_path).map_err(|e| {
        Error::invalid_input(format!("borders {}: {e}", borders_path.display()))
    })?;
    let mask_builder = VehicleMaskBuilder::new(country, models)?;
    let (transitions, mut connectors) = calc_cross_mwm_transitions(&borders, &mask_builder, features)?;

    info!(
        transitions = transitions.len(),
        elapsed_s = timer.elapsed().as_secs_f64(),
        "Transitions finished"
    );
    for (vehicle, connector) in connectors.iter() {
        info!(
            model = %vehicle,
            enters = connector.enters().len(),
            exits = connector.exits().len(),
            "Connector built"
        );
    }

    let mut container = RegionContainer::open_existing(container_path)?;
    let header = DataHeader::load(&mut container)?;

    // Leaps are only precomputed for cars
    let timer = Instant::now();
    let graph = load_car_graph(&mut container, country, features, models)?;
    LeapWeightComputer::new(&graph, config.leap_progress_interval)
        .fill_weights(connectors.get_mut(VehicleType::Car), config.leap_threads)?;
    info!(elapsed_s = timer.elapsed().as_secs_f64(), "Leaps finished");

    let car = connectors.get(VehicleType::Car);
    let (car_enters, car_exits) = (car.enters().len(), car.exits().len());
    let num_transitions = transitions.len();

    let section = CrossMwmSection::new(header.coding_params, transitions, connectors);
    let section_size = section.write(&mut container)?;
    info!(bytes = section_size, "Cross mwm section generated");

    Ok(CrossMwmStats {
        section_size,
        num_transitions,
        car_enters,
        car_exits,
    })
}

/// Regional graph for leap sweeps, rebuilt from the stored routing section.
fn load_car_graph(
    container: &mut RegionContainer,
    country: &str,
    features: &dyn FeatureSource,
    models: &dyn VehicleModelFactory,
) -> Result<IndexGraph> {
    let car = load_model(country, VehicleType::Car, models)?;
    let geometry = Geometry::load(features, car.as_ref())?;
    let mut graph = IndexGraph::new(geometry, EdgeEstimator::for_car(car.max_speed_kmph()));
    RoutingSection::load(container)?.import_into(&mut graph);
    Ok(graph)
}
