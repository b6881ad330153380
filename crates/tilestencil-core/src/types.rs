//! Launch geometry and thread identity types.
//!
//! These mirror the built-in index variables of a SIMT device
//! (`threadIdx`, `blockIdx`, `blockDim`, `gridDim`) but are passed to kernels
//! as plain values instead of being read from intrinsics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-dimensional extent used for block and grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim2 {
    /// Extent along x.
    pub x: u32,
    /// Extent along y.
    pub y: u32,
}

impl Dim2 {
    /// Create a new extent.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Total number of elements covered by this extent.
    #[inline]
    pub const fn volume(&self) -> usize {
        (self.x as usize) * (self.y as usize)
    }
}

impl fmt::Display for Dim2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Thread identity within a block.
///
/// `x` is the lane within the warp, `y` is the warp row within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThreadId {
    /// Lane index (column within the warp).
    pub x: u32,
    /// Warp row within the block.
    pub y: u32,
}

impl ThreadId {
    /// Create a thread identity.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Lane index as a `usize` for slice indexing.
    #[inline]
    pub const fn lane(&self) -> usize {
        self.x as usize
    }

    /// Warp row as a `usize` for slice indexing.
    #[inline]
    pub const fn row(&self) -> usize {
        self.y as usize
    }

    /// Linear index within a block of the given dimensions.
    #[inline]
    pub const fn linear(&self, block_dim: Dim2) -> usize {
        (self.y as usize) * (block_dim.x as usize) + (self.x as usize)
    }
}

/// Block identity within the launch grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId {
    /// Block index along x.
    pub x: u32,
    /// Block index along y.
    pub y: u32,
}

impl BlockId {
    /// Create a block identity.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Linear index within a grid of the given dimensions.
    #[inline]
    pub const fn linear(&self, grid_dim: Dim2) -> usize {
        (self.y as usize) * (grid_dim.x as usize) + (self.x as usize)
    }

    /// Inverse of [`BlockId::linear`].
    #[inline]
    pub const fn from_linear(index: usize, grid_dim: Dim2) -> Self {
        let width = grid_dim.x as usize;
        Self {
            x: (index % width) as u32,
            y: (index / width) as u32,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_volume() {
        assert_eq!(Dim2::new(32, 4).volume(), 128);
        assert_eq!(Dim2::new(1, 1).volume(), 1);
    }

    #[test]
    fn test_thread_linear() {
        let block = Dim2::new(32, 4);
        assert_eq!(ThreadId::new(0, 0).linear(block), 0);
        assert_eq!(ThreadId::new(5, 2).linear(block), 69);
    }

    #[test]
    fn test_block_linear_roundtrip() {
        let grid = Dim2::new(3, 5);
        for i in 0..grid.volume() {
            assert_eq!(BlockId::from_linear(i, grid).linear(grid), i);
        }
        assert_eq!(BlockId::from_linear(4, grid), BlockId::new(1, 1));
    }
}
