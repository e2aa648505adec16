//! Kinematics families and strategy selection

use crate::cartesian::ExactCartesianSplitter;
use crate::segmented::FixedLengthSegmenter;
use crate::strategy::StrategyHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Default segments-per-second rate for kinematic machines
pub const DEFAULT_SEGMENTS_PER_SECOND: f32 = 200.0;

/// Different types of machine kinematics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KinematicsType {
    /// Independent linear X/Y/Z axes
    #[default]
    Cartesian,
    /// Linear delta (three towers)
    Delta,
    /// Selective compliance arm
    Scara,
    /// Two-cable hanging plotter
    Polargraph,
}

impl KinematicsType {
    /// Whether straight Cartesian lines map to curved joint paths
    pub fn is_kinematic(&self) -> bool {
        !matches!(self, Self::Cartesian)
    }

    /// Shortest segment the fixed-length segmenter will emit, in mm
    pub fn default_min_segment_length(&self) -> f32 {
        match self {
            Self::Cartesian => 1.0,
            Self::Delta | Self::Polargraph => 0.1,
            Self::Scara => 0.25,
        }
    }
}

impl fmt::Display for KinematicsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cartesian => write!(f, "cartesian"),
            Self::Delta => write!(f, "delta"),
            Self::Scara => write!(f, "scara"),
            Self::Polargraph => write!(f, "polargraph"),
        }
    }
}

fn default_segments_per_second() -> f32 {
    DEFAULT_SEGMENTS_PER_SECOND
}

/// Motion settings that pick and tune a leveling strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Machine kinematics
    #[serde(default)]
    pub kinematics: KinematicsType,
    /// Preferred segment rate for kinematic machines
    #[serde(default = "default_segments_per_second")]
    pub segments_per_second: f32,
    /// Leveled segment length for Cartesian machines using the segmenter
    #[serde(default)]
    pub leveled_segment_length: Option<f32>,
    /// Use the fixed-length segmenter even on a Cartesian machine
    #[serde(default)]
    pub segmented: bool,
    /// Attach inverse segment durations (SCARA feed-rate scaling)
    #[serde(default)]
    pub feedrate_scaling: bool,
    /// Constant Z raise for destinations off the mesh, instead of extrapolating
    #[serde(default)]
    pub raise_when_off_mesh: Option<f32>,
}

impl MotionConfig {
    /// Minimum segment length for the configured kinematics
    pub fn min_segment_length(&self) -> f32 {
        match self.kinematics {
            KinematicsType::Cartesian => self
                .leveled_segment_length
                .unwrap_or_else(|| self.kinematics.default_min_segment_length()),
            other => other.default_min_segment_length(),
        }
    }

    /// Whether moves go through the fixed-length segmenter
    pub fn uses_segmenter(&self) -> bool {
        self.segmented || self.kinematics.is_kinematic()
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            kinematics: KinematicsType::default(),
            segments_per_second: DEFAULT_SEGMENTS_PER_SECOND,
            leveled_segment_length: None,
            segmented: false,
            feedrate_scaling: false,
            raise_when_off_mesh: None,
        }
    }
}

/// Factory for the strategy matching a motion configuration
pub fn create_strategy(config: &MotionConfig) -> StrategyHandle {
    if config.uses_segmenter() {
        debug!(
            "Using fixed-length segmenter for {} kinematics ({} mm minimum)",
            config.kinematics,
            config.min_segment_length()
        );
        Box::new(FixedLengthSegmenter::from_config(config))
    } else {
        debug!("Using exact Cartesian splitter");
        Box::new(ExactCartesianSplitter::new().with_raise_when_off_mesh(config.raise_when_off_mesh))
    }
}
