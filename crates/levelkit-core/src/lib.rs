//! # LevelKit Core
//!
//! Core types and the bed mesh model for LevelKit.
//! Provides the position and segment data types, the measured bed mesh with
//! its bilinear height correction, and the interfaces a leveling strategy
//! talks to: the motion planner, the leveling/fade policy, and the
//! reachability envelope.

pub mod correction;
pub mod data;
pub mod envelope;
pub mod error;
pub mod leveling;
pub mod mesh;
pub mod planner;

pub use correction::{CellCorners, CellPlane};
pub use data::{MoveOutcome, MoveRequest, Position, Segment};
pub use envelope::{BedEnvelope, Envelope, RadialEnvelope};
pub use error::{Error, GeometryError, MeshError, Result};
pub use leveling::{FadeLeveling, LevelingState};
pub use mesh::{BedMesh, CellIndex, MeshGeometry};
pub use planner::{MotionPlanner, SegmentQueue};
