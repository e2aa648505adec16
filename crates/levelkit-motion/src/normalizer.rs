//! Proportional Z/E advance for partial moves
//!
//! A partial move ending at some point on the requested line advances Z and E
//! in proportion to how far the dominant axis (X or Y, whichever moves
//! further) has progressed. The larger axis is used so the ratio keeps as
//! much precision as possible. It is chosen once per move.

use levelkit_core::Position;

/// Apportions Z and E along one requested move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisNormalizer {
    start: Position,
    end: Position,
    use_x: bool,
    /// `(z per mm, e per mm)` of dominant-axis travel; `None` when that travel is zero
    rates: Option<(f32, f32)>,
}

impl AxisNormalizer {
    /// Prepare the per-mm rates for the move `start -> end`
    pub fn new(start: Position, end: Position) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let use_x = dx.abs() > dy.abs();
        let on_axis = if use_x { dx } else { dy };

        let rates = if on_axis == 0.0 {
            None
        } else {
            let z_rate = (end.z - start.z) / on_axis;
            let e_rate = (end.e - start.e) / on_axis;
            (z_rate.is_finite() && e_rate.is_finite()).then_some((z_rate, e_rate))
        };

        Self {
            start,
            end,
            use_x,
            rates,
        }
    }

    /// Whether X is the dominant axis
    pub fn uses_x(&self) -> bool {
        self.use_x
    }

    /// Whether the dominant axis does not move, so every point takes the destination Z/E
    pub fn is_degenerate(&self) -> bool {
        self.rates.is_none()
    }

    /// Uncorrected position at planar point `(x, y)` on the move
    pub fn position_at(&self, x: f32, y: f32) -> Position {
        match self.rates {
            Some((z_rate, e_rate)) => {
                let on_axis = if self.use_x {
                    x - self.start.x
                } else {
                    y - self.start.y
                };
                Position::new(
                    x,
                    y,
                    self.start.z + on_axis * z_rate,
                    self.start.e + on_axis * e_rate,
                )
            }
            None => Position::new(x, y, self.end.z, self.end.e),
        }
    }
}
