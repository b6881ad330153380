//! Block-shared tile caches.
//!
//! Each warp of a block owns one row of the tile and walks its grid row in
//! lane-wide windows. Before the barrier of each step a warp writes only its
//! own row: the current slice (where the variant needs it) and the leading
//! edge of the next window. After the barrier it reads its own row, plus the
//! same column of the rows directly above and below.
//!
//! ```text
//!   window k-1      window k       window k+1
//! +--------------+--------------+--------------+
//! |      ..  L-1 | 0  ..    L-1 | 0  ..        |   warp row w
//! +--------------+--------------+--------------+
//!      west halo ^              ^ east halo (prefetched leading edge)
//! ```

mod masked;
mod modulo;
mod rotating;

pub use masked::MaskedRingTile;
pub use modulo::ModuloTile;
pub use rotating::RotatingTripleTile;

use tilestencil_core::{Dim2, Result, SimtConfig, ThreadId, WarpContext};

use crate::variant::TilingVariant;

/// Lanes per block row, as a `usize`.
#[inline]
pub(crate) fn lanes_of(block_dim: Dim2) -> usize {
    block_dim.x as usize
}

/// One step of a warp's sliding window over its grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    origin: usize,
    lanes: usize,
    rotation: usize,
}

impl Window {
    /// The first window of a row.
    pub const fn first(lanes: usize) -> Self {
        Self {
            origin: 0,
            lanes,
            rotation: 0,
        }
    }

    /// Grid column of lane 0.
    #[inline]
    pub const fn origin(&self) -> usize {
        self.origin
    }

    /// Lanes per window.
    #[inline]
    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Step number, starting at zero.
    #[inline]
    pub const fn step(&self) -> usize {
        self.origin / self.lanes
    }

    /// Rotation index of a triple buffer, in `0..3`.
    #[inline]
    pub const fn rotation(&self) -> usize {
        self.rotation
    }

    /// Grid column handled by `thread` in this window.
    #[inline]
    pub const fn column(&self, thread: ThreadId) -> usize {
        self.origin + thread.x as usize
    }

    /// Whether another window follows this one in a row of `x_size` cells.
    #[inline]
    pub const fn has_next(&self, x_size: usize) -> bool {
        self.origin + self.lanes < x_size
    }

    /// Whether the window still lies inside a row of `x_size` cells.
    #[inline]
    pub const fn in_row(&self, x_size: usize) -> bool {
        self.origin < x_size
    }

    /// Move to the next window and rotate buffer ownership.
    #[inline]
    pub fn advance(&mut self) {
        self.origin += self.lanes;
        self.rotation = (self.rotation + 1) % 3;
    }
}

/// Read-only view of the global input row owned by a warp.
#[derive(Debug, Clone, Copy)]
pub struct RowSource<'a> {
    input: &'a [i32],
    row_base: usize,
}

impl<'a> RowSource<'a> {
    /// View of the row starting at linear offset `row_base`.
    pub fn new(input: &'a [i32], row_base: usize) -> Self {
        Self { input, row_base }
    }

    /// Load column `x` of the row from global memory.
    #[inline]
    pub fn load(&self, warp: &WarpContext<'_>, x: usize) -> i32 {
        warp.load_global(self.input, self.row_base + x)
    }
}

/// Shared tile storage for one block plus its refresh and read policy.
///
/// Writes (`load_initial`, `refresh`, `prefetch`) touch only the calling
/// warp's row. Reads happen after the step barrier; `vertical` is the only
/// access to another warp's row.
pub trait TileCache: Sync + Sized {
    /// Which strategy this is.
    const VARIANT: TilingVariant;

    /// Allocate the shared storage of one block.
    fn alloc(block_dim: Dim2) -> Self;

    /// Extra launch preconditions of this layout.
    fn validate(_simt: &SimtConfig) -> Result<()> {
        Ok(())
    }

    /// Populate the tile before the first step.
    fn load_initial(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>);

    /// Per-step write of the current slice. Runs on every step, including the
    /// last one.
    fn refresh(&self, _warp: &WarpContext<'_>, _window: &Window, _src: &RowSource<'_>) {}

    /// Write the leading edge of the next window. Never called on the last
    /// step of a row.
    fn prefetch(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>);

    /// The lane's own value.
    fn centre(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32;

    /// Value one column to the right. For the last lane this is the first
    /// column of the prefetched next window.
    fn east(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32;

    /// Value one column to the left. For lane 0 this is the last column of
    /// the previous window.
    fn west(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32;

    /// Same column, warp row `row` of this block.
    fn vertical(
        &self,
        warp: &WarpContext<'_>,
        window: &Window,
        thread: ThreadId,
        row: usize,
    ) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_walk() {
        let mut window = Window::first(4);
        assert_eq!(window.column(ThreadId::new(3, 0)), 3);
        assert!(window.has_next(12));
        assert_eq!(window.rotation(), 0);

        window.advance();
        assert_eq!(window.origin(), 4);
        assert_eq!(window.step(), 1);
        assert_eq!(window.rotation(), 1);

        window.advance();
        assert!(!window.has_next(12));
        assert!(window.in_row(12));
        assert_eq!(window.rotation(), 2);

        window.advance();
        assert!(!window.in_row(12));
        assert_eq!(window.rotation(), 0);
    }

    #[test]
    fn test_single_window_row_has_no_next() {
        let window = Window::first(8);
        assert!(!window.has_next(8));
        assert!(window.in_row(8));
    }
}
