//! Modulo-indexed tile.
//!
//! Each warp row holds `3 * lanes` cells addressed with `x % (3 * lanes)`:
//! previous, current and next window. Every step rewrites the current slice
//! and, unless it is the last step, the next one. The redundant store keeps
//! the code free of any initial-load special case and serves as the
//! reference layout for the other two variants.

use tilestencil_core::{Dim2, SharedTile, ThreadId, WarpContext};

use super::{lanes_of, RowSource, TileCache, Window};
use crate::variant::TilingVariant;

/// Three windows per warp row, indexed modulo the row width.
#[derive(Debug)]
pub struct ModuloTile {
    tile: SharedTile,
    width: usize,
}

impl ModuloTile {
    #[inline]
    fn slot(&self, x: usize) -> usize {
        x % self.width
    }

    fn store_slice(
        &self,
        warp: &WarpContext<'_>,
        window: &Window,
        src: &RowSource<'_>,
        shift: usize,
    ) {
        let row = warp.warp_row() as usize;
        warp.for_each_lane(|t| {
            let x = window.column(t) + shift;
            warp.store_shared(&self.tile, row, self.slot(x), src.load(warp, x));
        });
    }
}

impl TileCache for ModuloTile {
    const VARIANT: TilingVariant = TilingVariant::Modulo;

    fn alloc(block_dim: Dim2) -> Self {
        let width = 3 * lanes_of(block_dim);
        Self {
            tile: SharedTile::new(block_dim.y as usize, width),
            width,
        }
    }

    /// Nothing to do: [`refresh`](TileCache::refresh) writes the current
    /// slice on every step.
    fn load_initial(&self, _warp: &WarpContext<'_>, _window: &Window, _src: &RowSource<'_>) {}

    fn refresh(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        self.store_slice(warp, window, src, 0);
    }

    fn prefetch(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        self.store_slice(warp, window, src, window.lanes());
    }

    fn centre(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        let slot = self.slot(window.column(thread));
        warp.load_shared(&self.tile, thread.row(), slot)
    }

    fn east(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        let slot = self.slot(window.column(thread) + 1);
        warp.load_shared(&self.tile, thread.row(), slot)
    }

    fn west(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        let slot = self.slot(window.column(thread) + self.width - 1);
        warp.load_shared(&self.tile, thread.row(), slot)
    }

    fn vertical(
        &self,
        warp: &WarpContext<'_>,
        window: &Window,
        thread: ThreadId,
        row: usize,
    ) -> i32 {
        let slot = self.slot(window.column(thread));
        warp.load_shared(&self.tile, row, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestencil_core::{BlockBarrier, BlockId};

    #[test]
    fn test_refresh_wraps_modulo_width() {
        let block_dim = Dim2::new(2, 1);
        let barrier = BlockBarrier::new(1);
        let warp = WarpContext::new(BlockId::default(), 0, block_dim, Dim2::new(1, 1), &barrier);
        let input: Vec<i32> = (1..=10).collect();
        let src = RowSource::new(&input, 0);
        let cache = ModuloTile::alloc(block_dim);

        let mut window = Window::first(2);
        for _ in 0..3 {
            cache.refresh(&warp, &window, &src);
            cache.prefetch(&warp, &window, &src);
            window.advance();
        }
        // Step 3 covers x = 6..8: refresh lands on slots 0..2 of a 6-wide row.
        cache.refresh(&warp, &window, &src);

        assert_eq!(cache.tile.row_snapshot(0), vec![7, 8, 3, 4, 5, 6]);
        let first = ThreadId::new(0, 0);
        assert_eq!(cache.centre(&warp, &window, first), 7);
        assert_eq!(cache.west(&warp, &window, first), 6);
        assert_eq!(warp.stats().shared_stores, 14);
    }
}
