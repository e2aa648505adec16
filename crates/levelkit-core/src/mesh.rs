//! Bed mesh model
//!
//! A uniform grid of measured bed-height deviations plus the conversions
//! between planar coordinates, cell indexes and sample lines.
//!
//! Samples are stored as `Option<f32>`: `None` marks a point with no
//! calibration data. Points outside the calibrated area resolve to the nearest
//! edge cell, so lookups never fail.

use crate::error::MeshError;
use serde::{Deserialize, Serialize};

/// Extent and resolution of a mesh grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// X coordinate of the first sample column
    pub min_x: f32,
    /// Y coordinate of the first sample row
    pub min_y: f32,
    /// X coordinate of the last sample column
    pub max_x: f32,
    /// Y coordinate of the last sample row
    pub max_y: f32,
    /// Number of sample points along X
    pub points_x: usize,
    /// Number of sample points along Y
    pub points_y: usize,
}

impl MeshGeometry {
    /// Create a geometry from its extent and point counts
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32, points_x: usize, points_y: usize) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            points_x,
            points_y,
        }
    }

    /// Geometry with its origin at `(min_x, min_y)` and the given uniform spacing
    pub fn with_spacing(min_x: f32, min_y: f32, x_dist: f32, y_dist: f32, points_x: usize, points_y: usize) -> Self {
        Self::new(
            min_x,
            min_y,
            min_x + x_dist * points_x.saturating_sub(1) as f32,
            min_y + y_dist * points_y.saturating_sub(1) as f32,
            points_x,
            points_y,
        )
    }

    /// Check that the grid describes at least one cell with positive spacing
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.points_x < 2 || self.points_y < 2 {
            return Err(MeshError::TooFewPoints {
                points_x: self.points_x,
                points_y: self.points_y,
            });
        }
        if !(self.min_x < self.max_x) {
            return Err(MeshError::InvalidExtent {
                axis: 'X',
                min: self.min_x,
                max: self.max_x,
            });
        }
        if !(self.min_y < self.max_y) {
            return Err(MeshError::InvalidExtent {
                axis: 'Y',
                min: self.min_y,
                max: self.max_y,
            });
        }
        Ok(())
    }

    /// Distance between adjacent sample columns
    pub fn x_dist(&self) -> f32 {
        (self.max_x - self.min_x) / (self.points_x - 1) as f32
    }

    /// Distance between adjacent sample rows
    pub fn y_dist(&self) -> f32 {
        (self.max_y - self.min_y) / (self.points_y - 1) as f32
    }

    /// Total number of samples in the grid
    pub fn sample_count(&self) -> usize {
        self.points_x * self.points_y
    }
}

/// Index of a mesh cell, addressed by its lower-left sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellIndex {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

impl CellIndex {
    /// Create a cell index
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Measured bed-height grid
///
/// Long-lived and owned by the leveling subsystem; strategies only borrow it
/// immutably for the duration of a move.
#[derive(Debug, Clone, PartialEq)]
pub struct BedMesh {
    geometry: MeshGeometry,
    x_dist: f32,
    y_dist: f32,
    inv_x_dist: f32,
    inv_y_dist: f32,
    /// Samples laid out `[ix][iy]`, i.e. `ix * points_y + iy`
    samples: Vec<Option<f32>>,
}

impl BedMesh {
    /// Create a mesh with every sample undefined
    pub fn new(geometry: MeshGeometry) -> Result<Self, MeshError> {
        geometry.validate()?;
        let x_dist = geometry.x_dist();
        let y_dist = geometry.y_dist();
        Ok(Self {
            geometry,
            x_dist,
            y_dist,
            inv_x_dist: 1.0 / x_dist,
            inv_y_dist: 1.0 / y_dist,
            samples: vec![None; geometry.sample_count()],
        })
    }

    /// Create a mesh from samples laid out `[ix][iy]`
    pub fn from_samples(geometry: MeshGeometry, samples: Vec<Option<f32>>) -> Result<Self, MeshError> {
        let mut mesh = Self::new(geometry)?;
        if samples.len() != mesh.samples.len() {
            return Err(MeshError::SampleCountMismatch {
                expected: mesh.samples.len(),
                actual: samples.len(),
            });
        }
        for (i, sample) in samples.into_iter().enumerate() {
            mesh.set(i / geometry.points_y, i % geometry.points_y, sample)?;
        }
        Ok(mesh)
    }

    /// Create a mesh by evaluating `f(ix, iy)` at every sample point
    pub fn from_fn<F>(geometry: MeshGeometry, f: F) -> Result<Self, MeshError>
    where
        F: Fn(usize, usize) -> Option<f32>,
    {
        let mut mesh = Self::new(geometry)?;
        for ix in 0..geometry.points_x {
            for iy in 0..geometry.points_y {
                mesh.set(ix, iy, f(ix, iy))?;
            }
        }
        Ok(mesh)
    }

    /// Grid extent and resolution
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// Number of sample points along X
    pub fn points_x(&self) -> usize {
        self.geometry.points_x
    }

    /// Number of sample points along Y
    pub fn points_y(&self) -> usize {
        self.geometry.points_y
    }

    /// Spacing between sample columns
    pub fn x_dist(&self) -> f32 {
        self.x_dist
    }

    /// Spacing between sample rows
    pub fn y_dist(&self) -> f32 {
        self.y_dist
    }

    pub(crate) fn inv_x_dist(&self) -> f32 {
        self.inv_x_dist
    }

    pub(crate) fn inv_y_dist(&self) -> f32 {
        self.inv_y_dist
    }

    /// Sample at `(ix, iy)`; `None` when undefined or out of range
    pub fn get(&self, ix: usize, iy: usize) -> Option<f32> {
        if ix >= self.geometry.points_x || iy >= self.geometry.points_y {
            return None;
        }
        self.samples[ix * self.geometry.points_y + iy]
    }

    /// Replace the sample at `(ix, iy)`
    pub fn set(&mut self, ix: usize, iy: usize, value: Option<f32>) -> Result<(), MeshError> {
        if ix >= self.geometry.points_x || iy >= self.geometry.points_y {
            return Err(MeshError::IndexOutOfRange {
                ix,
                iy,
                points_x: self.geometry.points_x,
                points_y: self.geometry.points_y,
            });
        }
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(MeshError::NonFiniteSample { ix, iy, value: v });
            }
        }
        self.samples[ix * self.geometry.points_y + iy] = value;
        Ok(())
    }

    /// Number of samples carrying calibration data
    pub fn defined_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }

    /// Sample value with undefined or out-of-range points read as zero
    pub fn sample_or_zero(&self, ix: i32, iy: i32) -> f32 {
        if ix < 0 || iy < 0 {
            return 0.0;
        }
        self.get(ix as usize, iy as usize).unwrap_or(0.0)
    }

    /// Unclamped cell column containing `x`
    pub fn cell_index_x_raw(&self, x: f32) -> i32 {
        ((x - self.geometry.min_x) * self.inv_x_dist).floor() as i32
    }

    /// Unclamped cell row containing `y`
    pub fn cell_index_y_raw(&self, y: f32) -> i32 {
        ((y - self.geometry.min_y) * self.inv_y_dist).floor() as i32
    }

    /// Cell column containing `x`, clamped to the grid
    pub fn cell_index_x(&self, x: f32) -> i32 {
        self.cell_index_x_raw(x).clamp(0, self.max_cell_x())
    }

    /// Cell row containing `y`, clamped to the grid
    pub fn cell_index_y(&self, y: f32) -> i32 {
        self.cell_index_y_raw(y).clamp(0, self.max_cell_y())
    }

    /// Cell containing the planar point, each axis clamped independently
    pub fn cell_index(&self, x: f32, y: f32) -> CellIndex {
        CellIndex::new(self.cell_index_x(x), self.cell_index_y(y))
    }

    /// Highest valid cell column
    pub fn max_cell_x(&self) -> i32 {
        self.geometry.points_x as i32 - 2
    }

    /// Highest valid cell row
    pub fn max_cell_y(&self) -> i32 {
        self.geometry.points_y as i32 - 2
    }

    /// X coordinate of sample column `i`
    pub fn mesh_x(&self, i: i32) -> f32 {
        self.geometry.min_x + i as f32 * self.x_dist
    }

    /// Y coordinate of sample row `i`
    pub fn mesh_y(&self, i: i32) -> f32 {
        self.geometry.min_y + i as f32 * self.y_dist
    }

    /// Whether `x` falls inside a calibrated cell column
    pub fn is_x_in_bounds(&self, x: f32) -> bool {
        (0..=self.max_cell_x()).contains(&self.cell_index_x_raw(x))
    }

    /// Whether `y` falls inside a calibrated cell row
    pub fn is_y_in_bounds(&self, y: f32) -> bool {
        (0..=self.max_cell_y()).contains(&self.cell_index_y_raw(y))
    }

    /// Whether the planar point lies inside the calibrated extent
    pub fn is_on_mesh(&self, x: f32, y: f32) -> bool {
        self.is_x_in_bounds(x) && self.is_y_in_bounds(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_3x3() -> BedMesh {
        BedMesh::new(MeshGeometry::with_spacing(0.0, 0.0, 50.0, 50.0, 3, 3)).unwrap()
    }

    #[test]
    fn test_geometry_spacing() {
        let geometry = MeshGeometry::new(10.0, 20.0, 210.0, 120.0, 5, 3);
        assert_eq!(geometry.x_dist(), 50.0);
        assert_eq!(geometry.y_dist(), 50.0);
        assert_eq!(geometry.sample_count(), 15);
    }

    #[test]
    fn test_geometry_validation() {
        assert!(matches!(
            MeshGeometry::new(0.0, 0.0, 10.0, 10.0, 1, 3).validate(),
            Err(MeshError::TooFewPoints { .. })
        ));
        assert!(matches!(
            MeshGeometry::new(10.0, 0.0, 10.0, 10.0, 3, 3).validate(),
            Err(MeshError::InvalidExtent { axis: 'X', .. })
        ));
        assert!(matches!(
            MeshGeometry::new(0.0, 5.0, 10.0, 1.0, 3, 3).validate(),
            Err(MeshError::InvalidExtent { axis: 'Y', .. })
        ));
    }

    #[test]
    fn test_cell_index_clamps_each_axis() {
        let mesh = mesh_3x3();
        assert_eq!(mesh.cell_index(25.0, 75.0), CellIndex::new(0, 1));
        assert_eq!(mesh.cell_index(-30.0, 75.0), CellIndex::new(0, 1));
        assert_eq!(mesh.cell_index(400.0, -1.0), CellIndex::new(1, 0));
        // The far edge belongs to the last cell, not a phantom one past it
        assert_eq!(mesh.cell_index(100.0, 100.0), CellIndex::new(1, 1));
    }

    #[test]
    fn test_mesh_line_coordinates() {
        let mesh = BedMesh::new(MeshGeometry::with_spacing(5.0, -10.0, 20.0, 25.0, 4, 4)).unwrap();
        assert_eq!(mesh.mesh_x(0), 5.0);
        assert_eq!(mesh.mesh_x(3), 65.0);
        assert_eq!(mesh.mesh_y(2), 40.0);
        assert_eq!(mesh.mesh_y(-1), -35.0);
    }

    #[test]
    fn test_bounds() {
        let mesh = mesh_3x3();
        assert!(mesh.is_x_in_bounds(0.0));
        assert!(mesh.is_x_in_bounds(99.9));
        assert!(!mesh.is_x_in_bounds(100.0));
        assert!(!mesh.is_y_in_bounds(-0.1));
        assert!(mesh.is_on_mesh(50.0, 50.0));
        assert!(!mesh.is_on_mesh(50.0, 150.0));
    }

    #[test]
    fn test_samples() {
        let mut mesh = mesh_3x3();
        assert_eq!(mesh.defined_count(), 0);
        assert_eq!(mesh.sample_or_zero(1, 1), 0.0);

        mesh.set(1, 2, Some(0.25)).unwrap();
        assert_eq!(mesh.get(1, 2), Some(0.25));
        assert_eq!(mesh.get(2, 1), None);
        assert_eq!(mesh.sample_or_zero(1, 2), 0.25);
        assert_eq!(mesh.sample_or_zero(-1, 2), 0.0);
        assert_eq!(mesh.defined_count(), 1);

        assert!(matches!(
            mesh.set(3, 0, Some(0.0)),
            Err(MeshError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            mesh.set(0, 0, Some(f32::NAN)),
            Err(MeshError::NonFiniteSample { .. })
        ));
    }

    #[test]
    fn test_from_samples_layout() {
        let geometry = MeshGeometry::with_spacing(0.0, 0.0, 10.0, 10.0, 2, 3);
        let samples = vec![Some(0.0), Some(0.1), Some(0.2), Some(1.0), None, Some(1.2)];
        let mesh = BedMesh::from_samples(geometry, samples).unwrap();

        assert_eq!(mesh.get(0, 2), Some(0.2));
        assert_eq!(mesh.get(1, 0), Some(1.0));
        assert_eq!(mesh.get(1, 1), None);

        let err = BedMesh::from_samples(geometry, vec![None; 5]).unwrap_err();
        assert_eq!(
            err,
            MeshError::SampleCountMismatch {
                expected: 6,
                actual: 5
            }
        );
    }
}
