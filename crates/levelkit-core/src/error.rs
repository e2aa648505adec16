//! Error handling for LevelKit
//!
//! Provides error types for the parts of the system that can fail:
//! - Mesh errors (grid construction and sample validation)
//! - Geometry errors (invalid machine envelopes or leveling parameters)
//!
//! The motion core never returns these. Move execution reports its result
//! through `MoveOutcome`; errors only arise while building the long-lived
//! objects a move runs against.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Mesh error type
///
/// Represents errors raised while constructing or populating a bed mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The grid needs at least two sample lines along each axis
    #[error("Mesh must have at least 2x2 points, got {points_x}x{points_y}")]
    TooFewPoints {
        /// Number of sample points along X.
        points_x: usize,
        /// Number of sample points along Y.
        points_y: usize,
    },

    /// Mesh extent is empty or inverted on an axis
    #[error("Invalid mesh extent on {axis}: min {min} must be below max {max}")]
    InvalidExtent {
        /// The offending axis name.
        axis: char,
        /// Lower bound of the extent.
        min: f32,
        /// Upper bound of the extent.
        max: f32,
    },

    /// Sample count does not match the grid dimensions
    #[error("Expected {expected} mesh samples, got {actual}")]
    SampleCountMismatch {
        /// Number of samples required by the grid.
        expected: usize,
        /// Number of samples supplied.
        actual: usize,
    },

    /// A sample index lies outside the grid
    #[error("Mesh index ({ix}, {iy}) out of range for {points_x}x{points_y} grid")]
    IndexOutOfRange {
        /// X index.
        ix: usize,
        /// Y index.
        iy: usize,
        /// Number of sample points along X.
        points_x: usize,
        /// Number of sample points along Y.
        points_y: usize,
    },

    /// A defined sample is infinite or NaN
    #[error("Mesh sample at ({ix}, {iy}) is not finite: {value}")]
    NonFiniteSample {
        /// X index.
        ix: usize,
        /// Y index.
        iy: usize,
        /// The rejected value.
        value: f32,
    },
}

/// Geometry error type
///
/// Represents invalid parameters for the collaborators a move runs against.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Fade height must be positive when set
    #[error("Fade height must be > 0, got {height}")]
    InvalidFadeHeight {
        /// The rejected fade height.
        height: f32,
    },

    /// Envelope bounds are empty or inverted
    #[error("Invalid envelope: {reason}")]
    InvalidEnvelope {
        /// Why the envelope was rejected.
        reason: String,
    },
}

/// Main error type for LevelKit
///
/// A unified error type that can represent any error from the core crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Mesh error
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl Error {
    /// Check if this is a mesh error
    pub fn is_mesh_error(&self) -> bool {
        matches!(self, Error::Mesh(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
