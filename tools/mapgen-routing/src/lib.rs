//! Offline routing index generator for map regions
//!
//! Builds the `routing` section (joint index and vehicle masks) and the
//! `cross_mwm` section (border transitions, connectors and car leap weights)
//! of a region container, and provides the query-time road graph that walks
//! the result.

pub mod borders;
pub mod cli;
pub mod config;
pub mod cross_mwm;
pub mod feature;
pub mod formats;
pub mod generator;
pub mod geometry;
pub mod index_graph;
pub mod processor;
pub mod profiles;
pub mod road_graph;
pub mod vehicle_mask;

pub use config::GeneratorConfig;
pub use generator::{build_cross_mwm_section, build_routing_index, init_region};
pub use mapgen_common::{Error, Result};
