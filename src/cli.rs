//! Command-line front end
//!
//! Loads a configuration, runs one move through the configured strategy and
//! collects the emitted segments for printing.

use anyhow::Context;
use clap::Parser;
use levelkit_core::{MoveOutcome, MoveRequest, Position, Segment, SegmentQueue};
use levelkit_motion::MotionContext;
use levelkit_settings::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Feed rate when none is given, in mm/s
pub const DEFAULT_FEED_RATE: f32 = 50.0;

/// Run one toolhead move through mesh compensation and print the corrected G1 moves
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "levelkit")]
#[command(about = "Mesh bed-leveling motion compensation", long_about = None)]
#[command(version)]
pub struct MoveArgs {
    /// Config file (defaults to <config dir>/levelkit/levelkit.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start X (mm)
    #[arg(allow_negative_numbers = true)]
    pub x0: f32,
    /// Start Y (mm)
    #[arg(allow_negative_numbers = true)]
    pub y0: f32,
    /// Start Z (mm)
    #[arg(allow_negative_numbers = true)]
    pub z0: f32,
    /// Start extruder position (mm)
    #[arg(allow_negative_numbers = true)]
    pub e0: f32,
    /// End X (mm)
    #[arg(allow_negative_numbers = true)]
    pub x1: f32,
    /// End Y (mm)
    #[arg(allow_negative_numbers = true)]
    pub y1: f32,
    /// End Z (mm)
    #[arg(allow_negative_numbers = true)]
    pub z1: f32,
    /// End extruder position (mm)
    #[arg(allow_negative_numbers = true)]
    pub e1: f32,

    /// Feed rate (mm/s)
    #[arg(default_value_t = DEFAULT_FEED_RATE, value_parser = parse_feed_rate)]
    pub feed_rate: f32,
}

impl MoveArgs {
    /// The move described by the positional arguments
    pub fn request(&self) -> MoveRequest {
        MoveRequest::new(
            Position::new(self.x0, self.y0, self.z0, self.e0),
            Position::new(self.x1, self.y1, self.z1, self.e1),
            self.feed_rate,
        )
    }
}

fn parse_feed_rate(arg: &str) -> Result<f32, String> {
    let feed: f32 = arg.parse().map_err(|e| format!("invalid number '{}': {}", arg, e))?;
    if feed > 0.0 && feed.is_finite() {
        Ok(feed)
    } else {
        Err(format!("feed rate must be > 0, got {}", feed))
    }
}

/// Everything one move produced
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    /// Name of the strategy that ran the move
    pub strategy: String,
    /// How the move ended
    pub outcome: MoveOutcome,
    /// Segments the planner accepted, in order
    pub segments: Vec<Segment>,
}

/// Load the given config file, or the one at the platform default location
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            Config::load_from_file(path).with_context(|| format!("Loading config {}", path.display()))
        }
        None => {
            let path = Config::default_config_path()?;
            Ok(Config::load_or_default(&path)?)
        }
    }
}

/// Run `request` through the strategy and collaborators described by `config`
pub fn run_move(config: &Config, request: &MoveRequest) -> anyhow::Result<MoveReport> {
    let mesh = config.bed_mesh()?;
    let leveling = config.leveling_state()?;
    let envelope = config.envelope()?;
    let strategy = config.strategy();
    let mut queue = SegmentQueue::new();

    info!(
        "Running {} -> {} with {} strategy ({} of {} mesh points defined)",
        request.start,
        request.end,
        strategy.name(),
        mesh.defined_count(),
        mesh.geometry().sample_count()
    );

    let outcome = {
        let mut ctx = MotionContext::new(&mesh, &leveling, envelope.as_ref(), &mut queue);
        strategy.line_to(request, &mut ctx)
    };
    debug!("Move finished: {:?}", outcome);

    Ok(MoveReport {
        strategy: strategy.name().to_string(),
        outcome,
        segments: queue.drain(),
    })
}
