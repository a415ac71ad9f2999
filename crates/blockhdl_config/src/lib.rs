//! Parsing and validation of `blockhdl.toml` project configuration files.
//!
//! The project file names the generated module, its parameters and boundary
//! ports, and the association table that maps each block kind to the
//! prebuilt hardware core implementing it.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
