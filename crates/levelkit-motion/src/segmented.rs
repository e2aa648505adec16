//! Fixed-length segmentation for kinematic machines
//!
//! Delta, SCARA and polargraph machines map a straight Cartesian line to a
//! curved joint-space path, so every move has to be cut into short pieces
//! regardless of the mesh. Each piece is corrected by the cell it lands in.
//!
//! Within one cell the bilinear plane is stepped incrementally (see
//! [`CellPlane`]); the cell is only looked up again when a step leaves it.

use crate::kinematics::{KinematicsType, MotionConfig, DEFAULT_SEGMENTS_PER_SECOND};
use crate::strategy::{LevelingStrategy, MotionContext, SegmentEmitter};
use levelkit_core::{CellPlane, MoveOutcome, MoveRequest};
use tracing::{debug, trace};

/// Cuts moves into equal-length segments
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLengthSegmenter {
    kinematics: KinematicsType,
    segments_per_second: f32,
    min_segment_length: f32,
    feedrate_scaling: bool,
}

impl FixedLengthSegmenter {
    /// Create a segmenter with the default segment length for `kinematics`
    pub fn new(kinematics: KinematicsType) -> Self {
        Self {
            kinematics,
            segments_per_second: DEFAULT_SEGMENTS_PER_SECOND,
            min_segment_length: kinematics.default_min_segment_length(),
            feedrate_scaling: false,
        }
    }

    /// Create a segmenter from motion settings
    pub fn from_config(config: &MotionConfig) -> Self {
        Self {
            kinematics: config.kinematics,
            segments_per_second: config.segments_per_second,
            min_segment_length: config.min_segment_length(),
            feedrate_scaling: config.feedrate_scaling,
        }
    }

    pub fn with_min_segment_length(mut self, length: f32) -> Self {
        self.min_segment_length = length;
        self
    }

    pub fn with_segments_per_second(mut self, rate: f32) -> Self {
        self.segments_per_second = rate;
        self
    }

    /// Attach `feed_rate / segment_length` to every segment
    pub fn with_feedrate_scaling(mut self, enabled: bool) -> Self {
        self.feedrate_scaling = enabled;
        self
    }

    pub fn kinematics(&self) -> KinematicsType {
        self.kinematics
    }

    pub fn min_segment_length(&self) -> f32 {
        self.min_segment_length
    }

    /// Number of segments for `xy_mm` of planar travel at `feed_rate` mm/s
    ///
    /// Never less than one, even for moves with no planar travel.
    pub fn segment_count(&self, xy_mm: f32, feed_rate: f32) -> u32 {
        // Float to int casts saturate, so huge or NaN counts stay bounded
        let limit = (xy_mm / self.min_segment_length).ceil() as u32;
        let count = if self.kinematics.is_kinematic() && feed_rate > 0.0 {
            let seconds = xy_mm / feed_rate;
            ((self.segments_per_second * seconds).round() as u32).min(limit)
        } else {
            limit
        };
        count.max(1)
    }
}

impl Default for FixedLengthSegmenter {
    fn default() -> Self {
        Self::new(KinematicsType::Cartesian)
    }
}

impl LevelingStrategy for FixedLengthSegmenter {
    fn name(&self) -> &str {
        "fixed_length"
    }

    fn description(&self) -> &str {
        "Cuts moves into equal-length segments corrected per mesh cell (kinematic machines)"
    }

    fn line_to(&self, request: &MoveRequest, ctx: &mut MotionContext<'_>) -> MoveOutcome {
        let start = request.start;
        let end = request.end;

        if !ctx.envelope.is_reachable(&end) {
            debug!("Destination {} is unreachable, move skipped", end);
            return MoveOutcome::Unreachable;
        }

        let total = end - start;
        let xy_mm = total.x.hypot(total.y);
        let mut segments = self.segment_count(xy_mm, request.feed_rate);
        let segment_mm = xy_mm.hypot(total.z) / segments as f32;
        let inv_duration = self
            .feedrate_scaling
            .then(|| request.feed_rate / segment_mm)
            .filter(|v| v.is_finite());
        let diff = total * (1.0 / segments as f32);

        debug!(
            "Segmenting {} -> {} into {} segments of {:.3} mm",
            start, end, segments, segment_mm
        );

        let mut emitter = SegmentEmitter::new(&mut *ctx.planner, request).with_lengths(segment_mm, inv_duration);

        if !ctx.leveling.is_active() || !ctx.leveling.is_active_at(end.z) {
            let mut raw = start;
            for _ in 1..segments {
                raw += diff;
                if !emitter.emit(raw, 0.0) {
                    return emitter.interrupted();
                }
            }
            return if emitter.emit(end, 0.0) {
                MoveOutcome::Moved(end)
            } else {
                emitter.interrupted()
            };
        }

        let mesh = ctx.mesh;
        let fade = ctx.leveling.fade_scaling_factor(end.z);
        let x_dist = mesh.x_dist();
        let y_dist = mesh.y_dist();
        let mut raw = start + diff;

        loop {
            // Points in the mesh inset resolve to the nearest real cell
            let cell = mesh.cell_index(raw.x, raw.y);
            let mut local_x = raw.x - mesh.mesh_x(cell.x);
            let mut local_y = raw.y - mesh.mesh_y(cell.y);
            let mut plane = CellPlane::new(mesh, cell, local_x, diff.x);
            trace!("Entering cell ({}, {}) with {} segments left", cell.x, cell.y, segments);

            loop {
                segments -= 1;
                if segments == 0 {
                    // Exact destination, free of accumulated step drift
                    let z0 = mesh.correction_at(end.x, end.y) * fade;
                    return if emitter.emit(end, z0) {
                        MoveOutcome::Moved(end)
                    } else {
                        emitter.interrupted()
                    };
                }

                if !emitter.emit(raw, plane.height(local_y) * fade) {
                    return emitter.interrupted();
                }

                raw += diff;
                local_x += diff.x;
                local_y += diff.y;
                if !(0.0..=x_dist).contains(&local_x) || !(0.0..=y_dist).contains(&local_y) {
                    break;
                }
                plane.advance();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_segment_count_rounds_up() {
        let seg = FixedLengthSegmenter::new(KinematicsType::Cartesian);
        assert_eq!(seg.segment_count(10.0, 50.0), 10);
        assert_eq!(seg.segment_count(10.2, 50.0), 11);
        assert_eq!(seg.segment_count(0.3, 50.0), 1);
    }

    #[test]
    fn test_at_least_one_segment() {
        let seg = FixedLengthSegmenter::new(KinematicsType::Delta);
        assert_eq!(seg.segment_count(0.0, 50.0), 1);
        assert_eq!(seg.segment_count(0.0, 0.0), 1);
    }

    #[test]
    fn test_kinematic_count_from_segments_per_second() {
        let seg = FixedLengthSegmenter::new(KinematicsType::Delta).with_segments_per_second(100.0);
        // 20mm at 100mm/s is 0.2s -> 20 segments, well under the 200 length limit
        assert_eq!(seg.segment_count(20.0, 100.0), 20);

        // Slow moves are capped by the minimum segment length
        let slow = seg.clone().with_min_segment_length(2.0);
        assert_eq!(slow.segment_count(20.0, 1.0), 10);
    }

    #[test]
    fn test_from_config() {
        let config = MotionConfig {
            kinematics: KinematicsType::Scara,
            segments_per_second: 80.0,
            feedrate_scaling: true,
            ..MotionConfig::default()
        };
        let seg = FixedLengthSegmenter::from_config(&config);
        assert_eq!(seg.kinematics(), KinematicsType::Scara);
        assert_eq!(seg.min_segment_length(), 0.25);
        assert!(seg.feedrate_scaling);
    }
}
