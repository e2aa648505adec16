//! Bilinear height correction
//!
//! Interpolates the Z correction at a point from the mesh samples around it.
//! Three entry points exist because the strategies need different amounts of
//! the cell:
//! - along a horizontal mesh line (a line crossing a row boundary)
//! - along a vertical mesh line (a line crossing a column boundary)
//! - anywhere inside a cell (full bilinear blend of all four corners)
//!
//! Undefined samples are read as zero before interpolating, so every result
//! is a defined number. Fade scaling is applied by the caller.

use crate::mesh::{BedMesh, CellIndex};
use tracing::warn;

/// The four corner samples of a cell, undefined corners read as zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCorners {
    /// Lower-left
    pub x0y0: f32,
    /// Lower-right
    pub x1y0: f32,
    /// Upper-left
    pub x0y1: f32,
    /// Upper-right
    pub x1y1: f32,
}

impl CellCorners {
    /// Read the corners of `cell` from the mesh
    pub fn of(mesh: &BedMesh, cell: CellIndex) -> Self {
        Self {
            x0y0: mesh.sample_or_zero(cell.x, cell.y),
            x1y0: mesh.sample_or_zero(cell.x + 1, cell.y),
            x0y1: mesh.sample_or_zero(cell.x, cell.y + 1),
            x1y1: mesh.sample_or_zero(cell.x + 1, cell.y + 1),
        }
    }
}

impl BedMesh {
    /// Correction at `x` on horizontal mesh line `iy`, between columns `ix` and `ix + 1`
    ///
    /// Returns `None` when the line indexes fall outside the grid.
    pub fn correction_on_horizontal_line(&self, x: f32, ix: i32, iy: i32) -> Option<f32> {
        if !self.line_in_range(ix, iy) {
            warn!("Horizontal mesh line lookup out of range: ({}, {})", ix, iy);
            return None;
        }
        let xratio = (x - self.mesh_x(ix)) * self.inv_x_dist();
        let z1 = self.sample_or_zero(ix, iy);
        // Never read past the last column
        let z2 = self.sample_or_zero(ix.min(self.max_cell_x()) + 1, iy);
        Some(z1 + xratio * (z2 - z1))
    }

    /// Correction at `y` on vertical mesh line `ix`, between rows `iy` and `iy + 1`
    ///
    /// Returns `None` when the line indexes fall outside the grid.
    pub fn correction_on_vertical_line(&self, y: f32, ix: i32, iy: i32) -> Option<f32> {
        if !self.line_in_range(ix, iy) {
            warn!("Vertical mesh line lookup out of range: ({}, {})", ix, iy);
            return None;
        }
        let yratio = (y - self.mesh_y(iy)) * self.inv_y_dist();
        let z1 = self.sample_or_zero(ix, iy);
        let z2 = self.sample_or_zero(ix, iy.min(self.max_cell_y()) + 1);
        Some(z1 + yratio * (z2 - z1))
    }

    /// Full bilinear correction at `(x, y)` using the corners of `cell`
    pub fn correction_in_cell(&self, x: f32, y: f32, cell: CellIndex) -> f32 {
        let c = CellCorners::of(self, cell);
        let xratio = (x - self.mesh_x(cell.x)) * self.inv_x_dist();
        let yratio = (y - self.mesh_y(cell.y)) * self.inv_y_dist();
        let z1 = c.x0y0 + xratio * (c.x1y0 - c.x0y0);
        let z2 = c.x0y1 + xratio * (c.x1y1 - c.x0y1);
        z1 + (z2 - z1) * yratio
    }

    /// Full bilinear correction at `(x, y)` in the (clamped) cell containing it
    pub fn correction_at(&self, x: f32, y: f32) -> f32 {
        self.correction_in_cell(x, y, self.cell_index(x, y))
    }

    fn line_in_range(&self, ix: i32, iy: i32) -> bool {
        (0..self.points_x() as i32).contains(&ix) && (0..self.points_y() as i32).contains(&iy)
    }
}

/// Bilinear plane of one cell, stepped incrementally along a fixed direction
///
/// Stepping by a constant `(dx, dy)` inside one cell changes the Y-intercept
/// along the lower edge and the Y-slope by constants, so each step costs two
/// additions instead of a full bilinear evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPlane {
    /// Height along the lower edge at the current local x
    z_cxy0: f32,
    /// Height slope per unit y at the current local x
    z_cxym: f32,
    /// Per-step change of `z_cxy0`
    z_sxy0: f32,
    /// Per-step change of `z_cxym`
    z_sxym: f32,
}

impl CellPlane {
    /// Build the plane for `cell`, positioned at cell-local `local_x`, stepping `step_x` per advance
    pub fn new(mesh: &BedMesh, cell: CellIndex, local_x: f32, step_x: f32) -> Self {
        let c = CellCorners::of(mesh, cell);
        let inv_x = mesh.inv_x_dist();
        let inv_y = mesh.inv_y_dist();

        // z slope per x along the lower and upper edges
        let z_xmy0 = (c.x1y0 - c.x0y0) * inv_x;
        let z_xmy1 = (c.x1y1 - c.x0y1) * inv_x;

        let z_cxy0 = c.x0y0 + z_xmy0 * local_x;
        let z_cxy1 = c.x0y1 + z_xmy1 * local_x;

        Self {
            z_cxy0,
            z_cxym: (z_cxy1 - z_cxy0) * inv_y,
            z_sxy0: z_xmy0 * step_x,
            z_sxym: (z_xmy1 - z_xmy0) * inv_y * step_x,
        }
    }

    /// Interpolated height at cell-local `local_y`
    pub fn height(&self, local_y: f32) -> f32 {
        self.z_cxy0 + self.z_cxym * local_y
    }

    /// Move the plane one step along X
    pub fn advance(&mut self) {
        self.z_cxy0 += self.z_sxy0;
        self.z_cxym += self.z_sxym;
    }
}
