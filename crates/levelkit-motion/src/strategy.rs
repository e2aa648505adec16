//! Leveling strategy interface
//!
//! A strategy turns one requested move into Z-corrected segments and hands
//! them to the planner. Both implementations share the mesh, the height
//! corrector and the axis normalizer; they differ only in where they cut the
//! line.

use levelkit_core::{
    BedMesh, Envelope, LevelingState, MotionPlanner, MoveOutcome, MoveRequest, Position, Segment,
};
use tracing::debug;

/// Everything a strategy needs besides the move itself
///
/// The mesh and leveling state are borrowed read-only for the whole move;
/// the planner is the only thing a strategy mutates.
pub struct MotionContext<'a> {
    /// Measured bed mesh
    pub mesh: &'a BedMesh,
    /// Leveling on/off and fade policy
    pub leveling: &'a dyn LevelingState,
    /// Kinematic reachability test
    pub envelope: &'a dyn Envelope,
    /// Consumer of finished segments
    pub planner: &'a mut dyn MotionPlanner,
}

impl<'a> MotionContext<'a> {
    /// Bundle the collaborators for one or more moves
    pub fn new(
        mesh: &'a BedMesh,
        leveling: &'a dyn LevelingState,
        envelope: &'a dyn Envelope,
        planner: &'a mut dyn MotionPlanner,
    ) -> Self {
        Self {
            mesh,
            leveling,
            envelope,
            planner,
        }
    }
}

/// Trait for mesh-compensated move strategies
///
/// Implementations run a move to completion on the calling thread, perform
/// no heap allocation, and never fail: a declined segment ends the move early
/// and is reported through [`MoveOutcome::Interrupted`].
pub trait LevelingStrategy: Send + Sync {
    /// Get the name/identifier of this strategy
    fn name(&self) -> &str;

    /// Get a description of how this strategy cuts moves
    fn description(&self) -> &str;

    /// Split `request` into corrected segments and submit them to the planner
    fn line_to(&self, request: &MoveRequest, ctx: &mut MotionContext<'_>) -> MoveOutcome;
}

/// Boxed strategy selected at configuration time
pub type StrategyHandle = Box<dyn LevelingStrategy>;

/// Submits segments for one move and remembers how far the move got
pub(crate) struct SegmentEmitter<'p> {
    planner: &'p mut dyn MotionPlanner,
    feed_rate: f32,
    extruder: u8,
    length: Option<f32>,
    inv_duration: Option<f32>,
    reached: Position,
}

impl<'p> SegmentEmitter<'p> {
    pub(crate) fn new(planner: &'p mut dyn MotionPlanner, request: &MoveRequest) -> Self {
        Self {
            planner,
            feed_rate: request.feed_rate,
            extruder: request.extruder,
            length: None,
            inv_duration: None,
            reached: request.start,
        }
    }

    /// Attach a nominal length and inverse duration to every segment
    pub(crate) fn with_lengths(mut self, length: f32, inv_duration: Option<f32>) -> Self {
        self.length = Some(length);
        self.inv_duration = inv_duration;
        self
    }

    /// Submit `target` raised by `z_correction`; false when the planner declined it
    pub(crate) fn emit(&mut self, target: Position, z_correction: f32) -> bool {
        let segment = Segment::new(target.with_z_offset(z_correction), self.feed_rate, self.extruder)
            .with_length(self.length)
            .with_inv_duration(self.inv_duration);
        if self.planner.buffer_segment(&segment) {
            self.reached = target;
            true
        } else {
            debug!("Planner declined segment to {}, stopping move", segment.target);
            false
        }
    }

    /// Uncorrected position of the last accepted segment
    pub(crate) fn reached(&self) -> Position {
        self.reached
    }

    pub(crate) fn interrupted(&self) -> MoveOutcome {
        MoveOutcome::Interrupted {
            reached: self.reached,
        }
    }
}
