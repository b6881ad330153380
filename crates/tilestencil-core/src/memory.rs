//! Block-shared scratch memory.
//!
//! A [`SharedTile`] models an on-chip `__shared__ int tile[rows][cols]`
//! array. It is allocated once per block and read/written concurrently by the
//! warps of that block. Cells are relaxed atomics: the block barrier is what
//! orders a write before the reads of other warps, so no stronger ordering is
//! needed on the individual accesses.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Two-dimensional block-shared array of `i32` values.
pub struct SharedTile {
    rows: usize,
    cols: usize,
    cells: Box<[AtomicI32]>,
}

impl SharedTile {
    /// Allocate a zero-filled tile of `rows` x `cols` cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        let cells = (0..rows * cols).map(|_| AtomicI32::new(0)).collect();
        Self { rows, cols, cells }
    }

    /// Number of rows (one per warp in all tile layouts).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns per row.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Read a cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[inline]
    pub fn load(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].load(Ordering::Relaxed)
    }

    /// Write a cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[inline]
    pub fn store(&self, row: usize, col: usize, value: i32) {
        self.cells[self.index(row, col)].store(value, Ordering::Relaxed);
    }

    /// Copy of one row, for inspection in tests and debugging.
    pub fn row_snapshot(&self, row: usize) -> Vec<i32> {
        (0..self.cols).map(|col| self.load(row, col)).collect()
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "shared tile access ({row}, {col}) outside {}x{}",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }
}

impl fmt::Debug for SharedTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTile")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_starts_zeroed() {
        let tile = SharedTile::new(4, 8);
        assert_eq!(tile.rows(), 4);
        assert_eq!(tile.cols(), 8);
        for row in 0..4 {
            assert_eq!(tile.row_snapshot(row), vec![0; 8]);
        }
    }

    #[test]
    fn test_store_load() {
        let tile = SharedTile::new(2, 3);
        tile.store(1, 2, 42);
        tile.store(0, 0, -7);
        assert_eq!(tile.load(1, 2), 42);
        assert_eq!(tile.load(0, 0), -7);
        assert_eq!(tile.row_snapshot(1), vec![0, 0, 42]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_panics() {
        let tile = SharedTile::new(2, 3);
        tile.load(0, 3);
    }
}
