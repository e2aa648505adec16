//! Configuration management for LevelKit
//!
//! Provides configuration file handling and validation for the leveling
//! subsystem. Supports JSON and TOML file formats; the default location is
//! the platform config directory.
//!
//! Configuration is organized into logical sections:
//! - Mesh (extent, resolution and the measured samples)
//! - Leveling (on/off and fade height)
//! - Motion (kinematics and segmentation)
//! - Envelope (reachable area for kinematic machines)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use levelkit_core::{BedEnvelope, BedMesh, Envelope, FadeLeveling, MeshGeometry, RadialEnvelope};
use levelkit_motion::{create_strategy, MotionConfig, StrategyHandle};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "levelkit";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "levelkit.toml";

/// One stored mesh sample
///
/// Undefined samples are written as NaN (`nan` in TOML, `null` in JSON) and
/// any non-finite value reads back as undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshSample(pub Option<f32>);

impl From<Option<f32>> for MeshSample {
    fn from(value: Option<f32>) -> Self {
        Self(value)
    }
}

impl Serialize for MeshSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.0.unwrap_or(f32::NAN))
    }
}

impl<'de> Deserialize<'de> for MeshSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<f32>::deserialize(deserializer)?;
        Ok(Self(value.filter(|v| v.is_finite())))
    }
}

/// Mesh extent, resolution and samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSettings {
    /// X of the first sample column
    pub min_x: f32,
    /// Y of the first sample row
    pub min_y: f32,
    /// X of the last sample column
    pub max_x: f32,
    /// Y of the last sample row
    pub max_y: f32,
    /// Sample points along X
    pub points_x: usize,
    /// Sample points along Y
    pub points_y: usize,
    /// Samples as `z_values[ix][iy]`; empty means nothing probed yet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub z_values: Vec<Vec<MeshSample>>,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            min_x: 10.0,
            min_y: 10.0,
            max_x: 210.0,
            max_y: 210.0,
            points_x: 10,
            points_y: 10,
            z_values: Vec::new(),
        }
    }
}

impl MeshSettings {
    /// Grid geometry described by these settings
    pub fn geometry(&self) -> MeshGeometry {
        MeshGeometry::new(self.min_x, self.min_y, self.max_x, self.max_y, self.points_x, self.points_y)
    }

    /// Build the bed mesh, checking the sample grid against the declared size
    pub fn to_mesh(&self) -> SettingsResult<BedMesh> {
        let geometry = self.geometry();
        if self.z_values.is_empty() {
            return Ok(BedMesh::new(geometry)?);
        }

        let short_column = self.z_values.iter().find(|column| column.len() != self.points_y);
        if self.z_values.len() != self.points_x || short_column.is_some() {
            let rows = short_column.map_or(self.points_y, Vec::len);
            return Err(ConfigError::MeshShape {
                expected: format!("{}x{}", self.points_x, self.points_y),
                found: format!("{}x{}", self.z_values.len(), rows),
            }
            .into());
        }

        let samples = self.z_values.iter().flatten().map(|sample| sample.0).collect();
        Ok(BedMesh::from_samples(geometry, samples)?)
    }

    /// Capture an existing mesh, samples included
    pub fn from_mesh(mesh: &BedMesh) -> Self {
        let geometry = mesh.geometry();
        let z_values = (0..geometry.points_x)
            .map(|ix| (0..geometry.points_y).map(|iy| MeshSample(mesh.get(ix, iy))).collect())
            .collect();
        Self {
            min_x: geometry.min_x,
            min_y: geometry.min_y,
            max_x: geometry.max_x,
            max_y: geometry.max_y,
            points_x: geometry.points_x,
            points_y: geometry.points_y,
            z_values,
        }
    }
}

/// Leveling switch and fade height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingSettings {
    /// Apply the mesh to moves
    pub enabled: bool,
    /// Height where correction has faded out; unset or 0 disables fading
    #[serde(default)]
    pub fade_height: Option<f32>,
}

impl Default for LevelingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fade_height: Some(10.0),
        }
    }
}

impl LevelingSettings {
    /// Build the fade policy
    pub fn to_leveling(&self) -> SettingsResult<FadeLeveling> {
        let mut leveling = match self.fade_height {
            Some(height) if height != 0.0 => FadeLeveling::with_fade_height(height)?,
            _ => FadeLeveling::new(),
        };
        leveling.active = self.enabled;
        Ok(leveling)
    }
}

/// Reachable area of the toolhead
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnvelopeSettings {
    /// Every position is reachable
    #[default]
    Unbounded,
    /// Rectangular bed limits
    Bed {
        min_x: f32,
        max_x: f32,
        min_y: f32,
        max_y: f32,
    },
    /// Printable radius around the origin
    Radial { radius: f32 },
}

impl EnvelopeSettings {
    /// Build the reachability test
    pub fn to_envelope(&self) -> SettingsResult<Box<dyn Envelope + Send + Sync>> {
        Ok(match *self {
            Self::Unbounded => Box::new(BedEnvelope::unbounded()),
            Self::Bed {
                min_x,
                max_x,
                min_y,
                max_y,
            } => Box::new(BedEnvelope::new(min_x, max_x, min_y, max_y)?),
            Self::Radial { radius } => Box::new(RadialEnvelope::new(radius)?),
        })
    }
}

/// Complete LevelKit configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Mesh geometry and samples
    #[serde(default)]
    pub mesh: MeshSettings,
    /// Leveling switch and fade
    #[serde(default)]
    pub leveling: LevelingSettings,
    /// Strategy selection and segmentation
    #[serde(default)]
    pub motion: MotionConfig,
    /// Reachable area
    #[serde(default)]
    pub envelope: EnvelopeSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/levelkit/levelkit.toml`
    pub fn default_config_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        // Mesh geometry and sample grid
        self.mesh.to_mesh()?;

        // Leveling
        if let Some(height) = self.leveling.fade_height {
            if !height.is_finite() || height < 0.0 {
                return Err(ConfigError::out_of_range("leveling.fade_height", height, ">= 0").into());
            }
        }

        // Motion
        let sps = self.motion.segments_per_second;
        if !(sps > 0.0 && sps.is_finite()) {
            return Err(ConfigError::out_of_range("motion.segments_per_second", sps, "> 0").into());
        }
        if let Some(length) = self.motion.leveled_segment_length {
            if !(length > 0.0 && length.is_finite()) {
                return Err(ConfigError::out_of_range("motion.leveled_segment_length", length, "> 0").into());
            }
        }
        if let Some(raise) = self.motion.raise_when_off_mesh {
            if !raise.is_finite() {
                return Err(ConfigError::out_of_range("motion.raise_when_off_mesh", raise, "a finite offset").into());
            }
        }

        // Envelope
        self.envelope.to_envelope()?;

        Ok(())
    }

    /// Bed mesh described by the mesh section
    pub fn bed_mesh(&self) -> SettingsResult<BedMesh> {
        self.mesh.to_mesh()
    }

    /// Fade policy described by the leveling section
    pub fn leveling_state(&self) -> SettingsResult<FadeLeveling> {
        self.leveling.to_leveling()
    }

    /// Reachability test described by the envelope section
    pub fn envelope(&self) -> SettingsResult<Box<dyn Envelope + Send + Sync>> {
        self.envelope.to_envelope()
    }

    /// Strategy selected by the motion section
    pub fn strategy(&self) -> StrategyHandle {
        create_strategy(&self.motion)
    }
}

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into()),
        }
    }
}
