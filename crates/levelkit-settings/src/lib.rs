//! LevelKit Settings Crate
//!
//! Handles configuration loading, validation and persistence, and turns a
//! configuration into the mesh, leveling policy, envelope and strategy a
//! move runs against.

pub mod config;
pub mod error;

pub use config::{
    Config, EnvelopeSettings, LevelingSettings, MeshSample, MeshSettings, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
