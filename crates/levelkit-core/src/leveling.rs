//! Leveling state and fade policy
//!
//! Whether leveling is active, and how much of the mesh correction to apply
//! at a given height, are decided outside the motion core. `LevelingState`
//! is the seam; `FadeLeveling` is the usual linear-fade policy.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

/// Leveling policy consulted by the strategies
pub trait LevelingState {
    /// Whether leveling is switched on at all
    fn is_active(&self) -> bool;

    /// Whether any correction applies at height `z`
    fn is_active_at(&self, z: f32) -> bool;

    /// Fraction of the mesh correction to apply at height `z`, in `[0, 1]`
    fn fade_scaling_factor(&self, z: f32) -> f32;
}

/// Linear fade from full correction at Z=0 to none at the fade height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeLeveling {
    /// Leveling enabled
    pub active: bool,
    /// Height at which correction reaches zero; `None` disables fading
    pub fade_height: Option<f32>,
}

impl FadeLeveling {
    /// Active leveling without fade
    pub fn new() -> Self {
        Self {
            active: true,
            fade_height: None,
        }
    }

    /// Leveling switched off
    pub fn disabled() -> Self {
        Self {
            active: false,
            fade_height: None,
        }
    }

    /// Active leveling fading out at `height`
    pub fn with_fade_height(height: f32) -> Result<Self, GeometryError> {
        if !(height > 0.0) || !height.is_finite() {
            return Err(GeometryError::InvalidFadeHeight { height });
        }
        Ok(Self {
            active: true,
            fade_height: Some(height),
        })
    }
}

impl Default for FadeLeveling {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelingState for FadeLeveling {
    fn is_active(&self) -> bool {
        self.active
    }

    fn is_active_at(&self, z: f32) -> bool {
        self.fade_height.is_none_or(|h| z < h)
    }

    fn fade_scaling_factor(&self, z: f32) -> f32 {
        match self.fade_height {
            Some(h) if z < h => (1.0 - z / h).clamp(0.0, 1.0),
            Some(_) => 0.0,
            None => 1.0,
        }
    }
}
