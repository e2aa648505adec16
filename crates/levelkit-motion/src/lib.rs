//! # LevelKit Motion
//!
//! Mesh-compensated motion strategies.
//!
//! Two strategies turn a requested move into Z-corrected segments:
//! - [`ExactCartesianSplitter`] cuts the move only where it crosses a mesh
//!   line, which is exact for Cartesian kinematics
//! - [`FixedLengthSegmenter`] cuts the move into equal pieces for kinematic
//!   machines and corrects each piece by the cell it lands in
//!
//! [`create_strategy`] picks one from a [`MotionConfig`].

pub mod cartesian;
pub mod kinematics;
pub mod normalizer;
pub mod segmented;
pub mod strategy;

pub use cartesian::ExactCartesianSplitter;
pub use kinematics::{create_strategy, KinematicsType, MotionConfig, DEFAULT_SEGMENTS_PER_SECOND};
pub use normalizer::AxisNormalizer;
pub use segmented::FixedLengthSegmenter;
pub use strategy::{LevelingStrategy, MotionContext, StrategyHandle};
