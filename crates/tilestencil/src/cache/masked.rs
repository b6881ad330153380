//! Masked ring buffer tile.
//!
//! Each warp row holds `4 * lanes` cells addressed with `x & (4 * lanes - 1)`.
//! Two live windows (current and next) fit with room to spare, so the
//! leading-edge write for window `k + 1` lands on the slot of window `k - 3`
//! and never collides with anything a slower warp of the block may still be
//! reading for window `k`.

use tilestencil_core::{Dim2, Result, SharedTile, SimtConfig, StencilError, ThreadId, WarpContext};

use super::{lanes_of, RowSource, TileCache, Window};
use crate::variant::TilingVariant;

/// Ring of four windows per warp row, indexed with a bitmask.
#[derive(Debug)]
pub struct MaskedRingTile {
    tile: SharedTile,
    mask: usize,
}

impl MaskedRingTile {
    #[inline]
    fn slot(&self, x: usize) -> usize {
        x & self.mask
    }
}

impl TileCache for MaskedRingTile {
    const VARIANT: TilingVariant = TilingVariant::Masked;

    fn alloc(block_dim: Dim2) -> Self {
        let width = 4 * lanes_of(block_dim);
        Self {
            tile: SharedTile::new(block_dim.y as usize, width),
            mask: width - 1,
        }
    }

    fn validate(simt: &SimtConfig) -> Result<()> {
        if simt.lanes.is_power_of_two() {
            Ok(())
        } else {
            Err(StencilError::InvalidConfig(format!(
                "masked ring tile needs a power-of-two lane count, got {}",
                simt.lanes
            )))
        }
    }

    fn load_initial(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        let row = warp.warp_row() as usize;
        warp.for_each_lane(|t| {
            let x = window.column(t);
            warp.store_shared(&self.tile, row, self.slot(x), src.load(warp, x));
        });
    }

    fn prefetch(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        let row = warp.warp_row() as usize;
        warp.for_each_lane(|t| {
            let x = window.column(t) + window.lanes();
            warp.store_shared(&self.tile, row, self.slot(x), src.load(warp, x));
        });
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
        // Adding the ring width keeps column 0 from underflowing.
        let slot = self.slot(window.column(thread) + self.mask);
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
