//! Data models for positions, move requests, and emitted segments
//!
//! This module provides:
//! - Four-axis toolhead positions (X, Y, Z, E)
//! - Move requests handed to a leveling strategy
//! - Fully resolved segments submitted to the motion planner
//! - The outcome a strategy reports back to its caller

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Toolhead position in millimeters, including the extruder axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f32,
    /// Y-axis position
    pub y: f32,
    /// Z-axis position
    pub z: f32,
    /// Extruder position
    pub e: f32,
}

impl Position {
    /// Create a new position from all four axes
    pub fn new(x: f32, y: f32, z: f32, e: f32) -> Self {
        Self { x, y, z, e }
    }

    /// Create a position on the XY plane with Z and E at zero
    pub fn xy(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Whether the planar (XY) components match exactly
    pub fn xy_eq(&self, other: &Position) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Planar distance to another position
    pub fn xy_distance_to(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Cartesian distance to another position (XYZ only)
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Copy of this position with Z shifted by `offset`
    pub fn with_z_offset(mut self, offset: f32) -> Self {
        self.z += offset;
        self
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.e + rhs.e)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
        self.e += rhs.e;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.e - rhs.e)
    }
}

impl Mul<f32> for Position {
    type Output = Position;

    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs, self.e * rhs)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X:{:.3} Y:{:.3} Z:{:.3} E:{:.3}",
            self.x, self.y, self.z, self.e
        )
    }
}

/// A requested straight-line move
///
/// Caller-owned and read-only to the strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Position the toolhead is at when the move starts
    pub start: Position,
    /// Requested destination
    pub end: Position,
    /// Feed rate in mm/s
    pub feed_rate: f32,
    /// Target extruder index
    pub extruder: u8,
}

impl MoveRequest {
    /// Create a move on extruder 0
    pub fn new(start: Position, end: Position, feed_rate: f32) -> Self {
        Self {
            start,
            end,
            feed_rate,
            extruder: 0,
        }
    }

    /// Set the target extruder
    pub fn with_extruder(mut self, extruder: u8) -> Self {
        self.extruder = extruder;
        self
    }

    /// Total displacement of the move
    pub fn delta(&self) -> Position {
        self.end - self.start
    }
}

/// One fully resolved sub-move handed to the motion planner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Target position, Z already corrected
    pub target: Position,
    /// Feed rate in mm/s
    pub feed_rate: f32,
    /// Target extruder index
    pub extruder: u8,
    /// Nominal 3-D length of the segment, when the strategy knows it
    pub length: Option<f32>,
    /// Reciprocal of the segment duration, for feed-rate scaled kinematics
    pub inv_duration: Option<f32>,
}

impl Segment {
    /// Create a segment without length hints
    pub fn new(target: Position, feed_rate: f32, extruder: u8) -> Self {
        Self {
            target,
            feed_rate,
            extruder,
            length: None,
            inv_duration: None,
        }
    }

    /// Attach the nominal segment length
    pub fn with_length(mut self, length: Option<f32>) -> Self {
        self.length = length;
        self
    }

    /// Attach the inverse segment duration
    pub fn with_inv_duration(mut self, inv_duration: Option<f32>) -> Self {
        self.inv_duration = inv_duration;
        self
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G1 X{:.3} Y{:.3} Z{:.3} E{:.5} F{:.0}",
            self.target.x,
            self.target.y,
            self.target.z,
            self.target.e,
            self.feed_rate * 60.0
        )
    }
}

/// Result of running one move through a leveling strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Every segment was accepted; the destination is the new current position
    Moved(Position),
    /// The planner declined a segment and the move stopped early
    Interrupted {
        /// Uncorrected position of the last accepted segment, or the start
        reached: Position,
    },
    /// The destination is outside the reachable envelope; nothing was submitted
    Unreachable,
}

impl MoveOutcome {
    /// Whether the toolhead did not move at all
    pub fn did_not_move(&self) -> bool {
        matches!(self, MoveOutcome::Unreachable)
    }

    /// Position the caller should treat as current, given where it started
    pub fn resolve(&self, start: Position) -> Position {
        match *self {
            MoveOutcome::Moved(end) => end,
            MoveOutcome::Interrupted { reached } => reached,
            MoveOutcome::Unreachable => start,
        }
    }
}
