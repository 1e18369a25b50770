//! Configuration loading and conversion
//!
//! [`FileConfig`] mirrors the TOML file verbatim; [`ConfigLoader`] merges it
//! from the usual locations. The converted [`EngineConfig`] is what the rest
//! of the system sees.
//!
//! [`EngineConfig`]: conclave_application::config::EngineConfig

mod file_config;
mod loader;

pub use file_config::{
    FileBackendConfig, FileConfig, FileConfigError, FileEngineConfig, FileOutputConfig,
    FileRoleConfig,
};
pub use loader::ConfigLoader;
