//! Grid addressing.
//!
//! Row-major mapping from a 2D coordinate to a linear buffer offset. No
//! bounds checking happens here; boundary policy belongs to the halo
//! resolver.

use serde::{Deserialize, Serialize};
use tilestencil_core::{Result, SimtConfig, StencilError};

/// Extent of a dense row-major grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Columns (row stride).
    pub x_size: usize,
    /// Rows.
    pub y_size: usize,
}

impl GridShape {
    /// Create a grid extent.
    pub const fn new(x_size: usize, y_size: usize) -> Self {
        Self { x_size, y_size }
    }

    /// Linear offset of `(x, y)`: `y * x_size + x`.
    #[inline(always)]
    pub const fn offset(&self, x: usize, y: usize) -> usize {
        y * self.x_size + x
    }

    /// Number of cells.
    #[inline]
    pub const fn len(&self) -> usize {
        self.x_size * self.y_size
    }

    /// True if the grid has no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the tiling preconditions: the width is a multiple of the lane
    /// count and the height a multiple of the warp count.
    pub fn validate(&self, simt: &SimtConfig) -> Result<()> {
        simt.validate()?;
        if self.is_empty() {
            return Err(StencilError::EmptyGrid {
                x_size: self.x_size,
                y_size: self.y_size,
            });
        }
        let lanes = simt.lanes as usize;
        if self.x_size % lanes != 0 {
            return Err(StencilError::GridNotAligned {
                axis: "x",
                size: self.x_size,
                multiple: lanes,
            });
        }
        let warps = simt.warps as usize;
        if self.y_size % warps != 0 {
            return Err(StencilError::GridNotAligned {
                axis: "y",
                size: self.y_size,
                multiple: warps,
            });
        }
        Ok(())
    }

    /// Check that `buffer` covers exactly this grid.
    pub fn check_buffer(&self, name: &'static str, buffer: &[i32]) -> Result<()> {
        if buffer.len() != self.len() {
            return Err(StencilError::BufferSizeMismatch {
                buffer: name,
                expected: self.len(),
                actual: buffer.len(),
            });
        }
        Ok(())
    }
}
