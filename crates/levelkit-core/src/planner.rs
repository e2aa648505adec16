//! Motion planner interface
//!
//! The strategies hand finished segments to a planner one at a time. The
//! planner may block while its queue drains and may decline a segment, which
//! the strategies treat as an instruction to stop the current move.

use crate::data::{Position, Segment};
use tracing::debug;

/// Consumer of leveled segments
pub trait MotionPlanner {
    /// Enqueue one segment; returns `false` when the segment was declined
    fn buffer_segment(&mut self, segment: &Segment) -> bool;

    /// Apply planner-side position modifiers (skew, etc.) before splitting
    fn apply_modifiers(&self, _position: &mut Position) {}
}

impl<F> MotionPlanner for F
where
    F: FnMut(&Segment) -> bool,
{
    fn buffer_segment(&mut self, segment: &Segment) -> bool {
        self(segment)
    }
}

/// Recording planner with an optional bounded capacity
///
/// Accepts segments until `capacity` is reached and declines everything
/// after that.
#[derive(Debug, Clone, Default)]
pub struct SegmentQueue {
    segments: Vec<Segment>,
    capacity: Option<usize>,
    rejected: usize,
}

impl SegmentQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that declines segments once `capacity` are held
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Segments accepted so far
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of accepted segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segment has been accepted
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments declined because the queue was full
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Target of the last accepted segment
    pub fn last_target(&self) -> Option<Position> {
        self.segments.last().map(|s| s.target)
    }

    /// Take all held segments out of the queue
    pub fn drain(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.segments)
    }
}

impl MotionPlanner for SegmentQueue {
    fn buffer_segment(&mut self, segment: &Segment) -> bool {
        if self.capacity.is_some_and(|cap| self.segments.len() >= cap) {
            self.rejected += 1;
            debug!("Segment queue full, declining segment to {}", segment.target);
            return false;
        }
        self.segments.push(*segment);
        true
    }
}
