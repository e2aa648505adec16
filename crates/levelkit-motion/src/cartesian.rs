//! Exact line/grid splitting for Cartesian machines
//!
//! On a machine whose kinematics are linear in Cartesian space, a straight
//! line between two mesh lines stays straight after correction, so it only
//! needs to be cut where it crosses a mesh line. This strategy computes those
//! crossings exactly and emits one segment per crossing, plus a final segment
//! to the destination when the last crossing does not land on it.
//!
//! Moves that stay inside one cell are the common case and take the cheap
//! path: one bilinear lookup at the destination, one segment.

use crate::normalizer::AxisNormalizer;
use crate::strategy::{LevelingStrategy, MotionContext, SegmentEmitter};
use levelkit_core::{BedMesh, CellIndex, MoveOutcome, MoveRequest, Position};
use tracing::{debug, trace};

/// `y = slope * x + intercept` through the start and end of a move
#[derive(Debug, Clone, Copy)]
struct Line {
    start_x: f32,
    slope: f32,
    intercept: f32,
    vertical: bool,
}

impl Line {
    fn through(start: &Position, end: &Position) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let slope = if dx == 0.0 { 0.0 } else { dy / dx };
        Self {
            start_x: start.x,
            slope,
            intercept: start.y - slope * start.x,
            vertical: dx == 0.0 || !slope.is_finite(),
        }
    }

    /// X where the line meets horizontal line `y`
    fn x_at(&self, y: f32) -> f32 {
        if self.vertical {
            self.start_x
        } else {
            (y - self.intercept) / self.slope
        }
    }

    /// Y where the line meets vertical line `x`
    fn y_at(&self, x: f32) -> f32 {
        self.slope * x + self.intercept
    }
}

/// Splits moves exactly at mesh-line crossings
#[derive(Debug, Clone, Default)]
pub struct ExactCartesianSplitter {
    /// Constant Z raise for destinations off the calibrated mesh
    raise_when_off_mesh: Option<f32>,
}

impl ExactCartesianSplitter {
    /// Create a splitter that extrapolates from the edge cells off the mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a constant Z raise instead of extrapolating when the destination is off the mesh
    pub fn with_raise_when_off_mesh(mut self, raise: Option<f32>) -> Self {
        self.raise_when_off_mesh = raise;
        self
    }

    /// Configured off-mesh raise
    pub fn raise_when_off_mesh(&self) -> Option<f32> {
        self.raise_when_off_mesh
    }

    /// Last segment of every move: bilinear correction at the destination
    ///
    /// Used directly for single-cell moves and to reconcile the remainder
    /// after stepping across mesh lines.
    fn finish_in_cell(
        &self,
        mesh: &BedMesh,
        end: Position,
        fade: f32,
        emitter: &mut SegmentEmitter<'_>,
    ) -> bool {
        if let Some(raise) = self.raise_when_off_mesh {
            if !mesh.is_x_in_bounds(end.x) || !mesh.is_y_in_bounds(end.y) {
                debug!("Destination {} off mesh, raising Z by {}", end, raise);
                return emitter.emit(end, raise);
            }
        }

        let cell = mesh.cell_index(end.x, end.y);
        let z0 = mesh.correction_in_cell(end.x, end.y, cell) * fade;
        emitter.emit(end, z0)
    }

    /// Line staying within one column: step across horizontal mesh lines
    #[allow(clippy::too_many_arguments)]
    fn step_rows(
        mesh: &BedMesh,
        start: Position,
        istart: CellIndex,
        iend: CellIndex,
        line: &Line,
        normalizer: &AxisNormalizer,
        fade: f32,
        emitter: &mut SegmentEmitter<'_>,
    ) -> Option<Position> {
        let neg = i32::from(iend.y < istart.y);
        let step = if iend.y < istart.y { -1 } else { 1 };
        let mut last = start;

        // Heading down starts from the lower edge of the start cell
        let mut iy = istart.y + neg;
        while iy != iend.y + neg {
            iy += step;
            let line_y = mesh.mesh_y(iy);
            let x = line.x_at(line_y);
            let z0 = mesh
                .correction_on_horizontal_line(x, istart.x, iy)
                .unwrap_or(0.0)
                * fade;

            if line_y == start.y {
                trace!("Skipping zero-length segment on mesh row {}", iy);
                continue;
            }

            let dest = normalizer.position_at(x, line_y);
            if !emitter.emit(dest, z0) {
                return None;
            }
            last = dest;
        }
        Some(last)
    }

    /// Line staying within one row: step across vertical mesh lines
    #[allow(clippy::too_many_arguments)]
    fn step_columns(
        mesh: &BedMesh,
        start: Position,
        istart: CellIndex,
        iend: CellIndex,
        line: &Line,
        normalizer: &AxisNormalizer,
        fade: f32,
        emitter: &mut SegmentEmitter<'_>,
    ) -> Option<Position> {
        let neg = i32::from(iend.x < istart.x);
        let step = if iend.x < istart.x { -1 } else { 1 };
        let mut last = start;

        // Heading left starts from the left edge of the start cell
        let mut ix = istart.x + neg;
        while ix != iend.x + neg {
            ix += step;
            let line_x = mesh.mesh_x(ix);
            let y = line.y_at(line_x);
            let z0 = mesh
                .correction_on_vertical_line(y, ix, istart.y)
                .unwrap_or(0.0)
                * fade;

            if line_x == start.x {
                trace!("Skipping zero-length segment on mesh column {}", ix);
                continue;
            }

            let dest = normalizer.position_at(line_x, y);
            if !emitter.emit(dest, z0) {
                return None;
            }
            last = dest;
        }
        Some(last)
    }

    /// Line crossing both row and column boundaries
    #[allow(clippy::too_many_arguments)]
    fn step_diagonal(
        mesh: &BedMesh,
        start: Position,
        istart: CellIndex,
        iend: CellIndex,
        line: &Line,
        normalizer: &AxisNormalizer,
        fade: f32,
        emitter: &mut SegmentEmitter<'_>,
    ) -> Option<Position> {
        let neg_x = iend.x < istart.x;
        let neg_y = iend.y < istart.y;
        let ineg = CellIndex::new(i32::from(neg_x), i32::from(neg_y));
        let iadd = CellIndex::new(if neg_x { -1 } else { 1 }, if neg_y { -1 } else { 1 });

        let mut cnt_x = (istart.x - iend.x).abs();
        let mut cnt_y = (istart.y - iend.y).abs();
        let mut icell = CellIndex::new(istart.x + ineg.x, istart.y + ineg.y);
        let mut last = start;

        while cnt_x != 0 || cnt_y != 0 {
            let next_line_x = mesh.mesh_x(icell.x + iadd.x);
            let next_line_y = mesh.mesh_y(icell.y + iadd.y);

            // Where the line meets the next column line and the next row line
            let y_at_next_x = line.y_at(next_line_x);
            let x_at_next_y = line.x_at(next_line_y);

            if neg_x == (x_at_next_y > next_line_x) {
                // Row line comes first
                let z0 = mesh
                    .correction_on_horizontal_line(x_at_next_y, icell.x - ineg.x, icell.y + iadd.y)
                    .unwrap_or(0.0)
                    * fade;

                if next_line_y == start.y {
                    trace!("Skipping zero-length segment on mesh row {}", icell.y + iadd.y);
                } else if x_at_next_y == last.x && next_line_y == last.y {
                    trace!("Skipping repeated grid corner on mesh row {}", icell.y + iadd.y);
                } else {
                    let dest = normalizer.position_at(x_at_next_y, next_line_y);
                    if !emitter.emit(dest, z0) {
                        return None;
                    }
                    last = dest;
                }

                icell.y += iadd.y;
                cnt_y -= 1;
            } else {
                // Column line comes first
                let z0 = mesh
                    .correction_on_vertical_line(y_at_next_x, icell.x + iadd.x, icell.y - ineg.y)
                    .unwrap_or(0.0)
                    * fade;

                if next_line_x == start.x {
                    trace!("Skipping zero-length segment on mesh column {}", icell.x + iadd.x);
                } else if next_line_x == last.x && y_at_next_x == last.y {
                    trace!("Skipping repeated grid corner on mesh column {}", icell.x + iadd.x);
                } else {
                    let dest = normalizer.position_at(next_line_x, y_at_next_x);
                    if !emitter.emit(dest, z0) {
                        return None;
                    }
                    last = dest;
                }

                icell.x += iadd.x;
                cnt_x -= 1;
            }

            // Rounding drift walked past the destination cell; reconcile from here
            if cnt_x < 0 || cnt_y < 0 {
                debug!("Diagonal stepping overshot the destination cell");
                break;
            }
        }
        Some(last)
    }
}

impl LevelingStrategy for ExactCartesianSplitter {
    fn name(&self) -> &str {
        "exact_cartesian"
    }

    fn description(&self) -> &str {
        "Splits moves exactly where they cross mesh lines (Cartesian kinematics)"
    }

    fn line_to(&self, request: &MoveRequest, ctx: &mut MotionContext<'_>) -> MoveOutcome {
        let mut start = request.start;
        let mut end = request.end;
        ctx.planner.apply_modifiers(&mut start);
        ctx.planner.apply_modifiers(&mut end);

        let mesh = ctx.mesh;
        let is_active = ctx.leveling.is_active();
        let fade = ctx.leveling.fade_scaling_factor(end.z);
        let mut emitter = SegmentEmitter::new(&mut *ctx.planner, request);

        if !is_active {
            return if emitter.emit(end, 0.0) {
                MoveOutcome::Moved(request.end)
            } else {
                emitter.interrupted()
            };
        }

        let istart = mesh.cell_index(start.x, start.y);
        let iend = mesh.cell_index(end.x, end.y);

        if istart == iend {
            return if self.finish_in_cell(mesh, end, fade, &mut emitter) {
                MoveOutcome::Moved(request.end)
            } else {
                emitter.interrupted()
            };
        }

        let line = Line::through(&start, &end);
        let normalizer = AxisNormalizer::new(start, end);

        let stepped = if istart.x == iend.x {
            debug!("Splitting vertical move {} -> {}", start, end);
            Self::step_rows(mesh, start, istart, iend, &line, &normalizer, fade, &mut emitter)
        } else if istart.y == iend.y {
            debug!("Splitting horizontal move {} -> {}", start, end);
            Self::step_columns(mesh, start, istart, iend, &line, &normalizer, fade, &mut emitter)
        } else {
            debug!("Splitting diagonal move {} -> {}", start, end);
            Self::step_diagonal(mesh, start, istart, iend, &line, &normalizer, fade, &mut emitter)
        };

        let Some(last) = stepped else {
            return emitter.interrupted();
        };

        if !last.xy_eq(&end) && !self.finish_in_cell(mesh, end, fade, &mut emitter) {
            return emitter.interrupted();
        }

        trace!("Move complete at {}", emitter.reached());
        MoveOutcome::Moved(request.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_equation() {
        let line = Line::through(&Position::xy(0.0, 1.0), &Position::xy(4.0, 9.0));
        assert!(!line.vertical);
        assert_eq!(line.y_at(2.0), 5.0);
        assert_eq!(line.x_at(5.0), 2.0);
    }

    #[test]
    fn test_vertical_line_keeps_start_x() {
        let line = Line::through(&Position::xy(7.5, 0.0), &Position::xy(7.5, 90.0));
        assert!(line.vertical);
        assert_eq!(line.x_at(42.0), 7.5);
    }
}
