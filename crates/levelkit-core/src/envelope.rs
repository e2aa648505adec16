//! Reachability envelopes
//!
//! Kinematic machines refuse moves whose destination the arm or towers cannot
//! reach. The envelope test itself belongs to the kinematics; these are the
//! two common shapes.

use crate::data::Position;
use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

/// Kinematic reachability test
pub trait Envelope {
    /// Whether the toolhead can reach `position`
    fn is_reachable(&self, position: &Position) -> bool;
}

/// Rectangular XY bed limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedEnvelope {
    /// X minimum
    pub min_x: f32,
    /// X maximum
    pub max_x: f32,
    /// Y minimum
    pub min_y: f32,
    /// Y maximum
    pub max_y: f32,
}

impl BedEnvelope {
    /// Create bed limits
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Result<Self, GeometryError> {
        if !(min_x <= max_x) || !(min_y <= max_y) {
            return Err(GeometryError::InvalidEnvelope {
                reason: format!("bed limits X[{min_x}, {max_x}] Y[{min_y}, {max_y}] are inverted"),
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Limits that accept any position
    pub fn unbounded() -> Self {
        Self {
            min_x: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            min_y: f32::NEG_INFINITY,
            max_y: f32::INFINITY,
        }
    }
}

impl Envelope for BedEnvelope {
    fn is_reachable(&self, position: &Position) -> bool {
        (self.min_x..=self.max_x).contains(&position.x) && (self.min_y..=self.max_y).contains(&position.y)
    }
}

/// Circular printable area centred on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialEnvelope {
    /// Printable radius in mm
    pub radius: f32,
}

impl RadialEnvelope {
    /// Create a radial envelope
    pub fn new(radius: f32) -> Result<Self, GeometryError> {
        if !(radius > 0.0) {
            return Err(GeometryError::InvalidEnvelope {
                reason: format!("printable radius must be > 0, got {radius}"),
            });
        }
        Ok(Self { radius })
    }
}

impl Envelope for RadialEnvelope {
    fn is_reachable(&self, position: &Position) -> bool {
        position.x * position.x + position.y * position.y <= self.radius * self.radius
    }
}
