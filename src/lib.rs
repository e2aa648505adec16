//! # LevelKit
//!
//! Mesh bed-leveling motion compensation for 3D printers and other
//! Z-sensitive machines. Given a straight toolhead move and a measured grid
//! of bed-height deviations, LevelKit produces Z-corrected sub-moves so the
//! toolhead follows the real bed surface.
//!
//! ## Architecture
//!
//! LevelKit is organized as a workspace with multiple crates:
//!
//! 1. **levelkit-core** - Positions, segments, the bed mesh and its bilinear correction
//! 2. **levelkit-motion** - Exact Cartesian splitting and fixed-length segmentation
//! 3. **levelkit-settings** - TOML/JSON configuration and validation
//! 4. **levelkit** - This crate: re-exports, logging setup and the command-line tool
//!
//! ## Features
//!
//! - **Exact Splitting**: Cartesian moves are cut only where they cross mesh lines
//! - **Fixed-Length Segmentation**: Delta, SCARA and polargraph moves are cut into
//!   short pieces, each corrected by its cell
//! - **Fade**: Correction tapers off linearly up to a configurable height
//! - **Backpressure**: A planner that declines a segment ends the move cleanly

pub mod cli;

pub use levelkit_core::{
    BedEnvelope, BedMesh, CellIndex, Envelope, Error, FadeLeveling, LevelingState, MeshError, MeshGeometry,
    MotionPlanner, MoveOutcome, MoveRequest, Position, RadialEnvelope, Result, Segment, SegmentQueue,
};
pub use levelkit_motion::{
    create_strategy, ExactCartesianSplitter, FixedLengthSegmenter, KinematicsType, LevelingStrategy, MotionConfig,
    MotionContext, StrategyHandle,
};
pub use levelkit_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Environment variable selecting the log output format (`pretty` or `json`)
pub const LOG_FORMAT_ENV: &str = "LEVELKIT_LOG_FORMAT";

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout for emitted G-code
/// - RUST_LOG environment variable support (INFO when unset)
/// - Pretty formatting, or JSON lines when `LEVELKIT_LOG_FORMAT=json`
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
