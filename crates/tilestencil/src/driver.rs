//! Sliding-window driver.
//!
//! One warp per grid row. Each step the warp refreshes its tile row, meets
//! the rest of the block at the barrier, gathers the five stencil terms for
//! every lane and writes them back, then slides one lane-width to the right.

use std::marker::PhantomData;

use tilestencil_core::{BlockKernel, Dim2, Result, WarpContext};
use tracing::trace;

use crate::cache::{RowSource, TileCache, Window};
use crate::grid::GridShape;
use crate::halo::{Direction, HaloResolver, LaneCoord};
use crate::protocol::{StepPhase, StepProtocol};

/// Five-point stencil kernel over tile cache `C`.
pub struct StencilKernel<'a, C> {
    input: &'a [i32],
    grid: GridShape,
    _cache: PhantomData<fn() -> C>,
}

impl<'a, C: TileCache> StencilKernel<'a, C> {
    /// Kernel reading `input`, laid out as `grid`.
    pub fn new(input: &'a [i32], grid: GridShape) -> Self {
        Self {
            input,
            grid,
            _cache: PhantomData,
        }
    }

    /// Grid this kernel covers.
    pub fn grid(&self) -> GridShape {
        self.grid
    }
}

impl<C> std::fmt::Debug for StencilKernel<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StencilKernel")
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl<C: TileCache> BlockKernel for StencilKernel<'_, C> {
    type Shared = C;

    fn name(&self) -> &str {
        C::VARIANT.kernel_name()
    }

    fn row_stride(&self) -> usize {
        self.grid.x_size
    }

    fn alloc_shared(&self, block_dim: Dim2) -> C {
        C::alloc(block_dim)
    }

    fn run_warp(&self, warp: &mut WarpContext<'_>, cache: &C, out_row: &mut [i32]) -> Result<()> {
        let block_dim = warp.block_dim();
        let y = warp.block_id().y as usize * block_dim.y as usize + warp.warp_row() as usize;
        let x_size = self.grid.x_size;

        let src = RowSource::new(self.input, self.grid.offset(0, y));
        let halo = HaloResolver::new(cache, self.input, self.grid);
        let mut protocol = StepProtocol::new();
        let mut window = Window::first(block_dim.x as usize);

        cache.load_initial(warp, &window, &src);

        while window.in_row(x_size) {
            warp.record_step();

            protocol.enter(StepPhase::Prefetch)?;
            cache.refresh(warp, &window, &src);
            if window.has_next(x_size) {
                cache.prefetch(warp, &window, &src);
                warp.record_prefetch();
            }

            protocol.enter(StepPhase::Barrier)?;
            warp.sync_threads()?;

            protocol.enter(StepPhase::Compute)?;
            let mut acc = warp.map_lanes(|t| cache.centre(warp, &window, t));
            for dir in Direction::ALL {
                if warp.diverge(|t| halo.in_grid(dir, &LaneCoord::new(&self.grid, &window, t, y))) {
                    warp.for_each_lane(|t| {
                        let coord = LaneCoord::new(&self.grid, &window, t, y);
                        let lane = t.lane();
                        acc[lane] = acc[lane].wrapping_add(halo.fetch(warp, &window, dir, &coord));
                    });
                }
                warp.converge();
                protocol.reconverged(dir)?;
            }

            protocol.enter(StepPhase::Writeback)?;
            let origin = window.origin();
            out_row[origin..origin + acc.len()].copy_from_slice(&acc);

            protocol.enter(StepPhase::Advance)?;
            trace!(
                block = %warp.block_id(),
                warp = warp.warp_row(),
                step = window.step(),
                "window done"
            );
            window.advance();
        }

        protocol.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MaskedRingTile, ModuloTile, RotatingTripleTile};
    use tilestencil_core::{BlockBarrier, BlockId};

    /// A single-warp block runs without a partner at the barrier.
    fn run_single_row<C: TileCache>(input: &[i32], grid: GridShape, lanes: u32) -> Vec<i32> {
        let kernel = StencilKernel::<C>::new(input, grid);
        let block_dim = Dim2::new(lanes, 1);
        let cache = kernel.alloc_shared(block_dim);
        let barrier = BlockBarrier::new(1);
        let mut warp = WarpContext::new(BlockId::default(), 0, block_dim, Dim2::new(1, 1), &barrier);
        let mut out = vec![0; grid.x_size];
        kernel.run_warp(&mut warp, &cache, &mut out).unwrap();
        out
    }

    #[test]
    fn test_single_row_is_three_point() {
        let grid = GridShape::new(8, 1);
        let input: Vec<i32> = (1..=8).collect();
        let expected = vec![3, 6, 9, 12, 15, 18, 21, 15];

        assert_eq!(run_single_row::<MaskedRingTile>(&input, grid, 4), expected);
        assert_eq!(run_single_row::<ModuloTile>(&input, grid, 4), expected);
        assert_eq!(run_single_row::<RotatingTripleTile>(&input, grid, 4), expected);
    }

    #[test]
    fn test_kernel_names() {
        let input = [0; 4];
        let grid = GridShape::new(4, 1);
        assert_eq!(StencilKernel::<MaskedRingTile>::new(&input, grid).name(), "stencil_masked_ring");
        assert_eq!(StencilKernel::<RotatingTripleTile>::new(&input, grid).row_stride(), 4);
    }
}
