//! Binary formats of the region container and its sections

pub mod codec;
pub mod container;
pub mod crc;
pub mod cross_mwm_section;
pub mod header;
pub mod routing_section;

pub use container::{RegionContainer, SectionEntry};
pub use cross_mwm_section::{CrossMwmSection, CROSS_MWM_FILE_TAG};
pub use header::{CodingParams, DataHeader, HEADER_FILE_TAG};
pub use routing_section::{RoutingSection, ROUTING_FILE_TAG};
