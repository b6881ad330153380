//! CPU runtime implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use tilestencil_core::error::{Result, StencilError};
use tilestencil_core::launch::{BlockKernel, ExecutionMode, LaunchConfig};
use tilestencil_core::stats::LaunchStats;
use tilestencil_core::sync::BlockBarrier;
use tilestencil_core::types::BlockId;
use tilestencil_core::warp::WarpContext;

/// CPU-based SIMT runtime.
///
/// Each block gets its own shared storage and barrier. The warps of a block
/// run as scoped OS threads so they can meet at the barrier; blocks are
/// scheduled on the rayon pool or sequentially depending on
/// [`ExecutionMode`].
pub struct CpuRuntime {
    /// Total launches that completed successfully.
    total_launched: AtomicU64,
    /// Statistics of the most recent successful launch.
    last_stats: RwLock<Option<LaunchStats>>,
}

impl Default for CpuRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuRuntime {
    /// Create a new CPU runtime.
    pub fn new() -> Self {
        debug!("Initializing CPU SIMT runtime");
        Self {
            total_launched: AtomicU64::new(0),
            last_stats: RwLock::new(None),
        }
    }

    /// Number of successful launches.
    pub fn total_launched(&self) -> u64 {
        self.total_launched.load(Ordering::Relaxed)
    }

    /// Statistics of the most recent successful launch.
    pub fn last_stats(&self) -> Option<LaunchStats> {
        self.last_stats.read().clone()
    }

    /// Execute `kernel` over the launch grid.
    ///
    /// `output` is split into one contiguous slice of
    /// `block_dim.y * kernel.row_stride()` elements per block (in block-row
    /// order) and then one `row_stride()` slice per warp. The grid must
    /// therefore be a single block column.
    pub fn launch<K: BlockKernel>(
        &self,
        kernel: &K,
        config: &LaunchConfig,
        output: &mut [i32],
    ) -> Result<LaunchStats> {
        let row_stride = kernel.row_stride();
        let warps = config.block_dim.y as usize;
        validate_partition(config, row_stride, output.len())?;

        info!(
            "Launching '{}' (grid={}, block={}, mode={:?})",
            kernel.name(),
            config.grid_dim,
            config.block_dim,
            config.mode
        );

        let start = Instant::now();
        let block_len = warps * row_stride;

        let per_block: Vec<Result<LaunchStats>> = match config.mode {
            ExecutionMode::Parallel => output
                .par_chunks_mut(block_len)
                .enumerate()
                .map(|(index, block_out)| run_block(kernel, config, index, block_out))
                .collect(),
            ExecutionMode::Sequential => output
                .chunks_mut(block_len)
                .enumerate()
                .map(|(index, block_out)| run_block(kernel, config, index, block_out))
                .collect(),
        };

        let mut stats = LaunchStats::default();
        for block in per_block {
            stats.merge(&block?);
        }
        stats.elapsed = start.elapsed();

        self.total_launched.fetch_add(1, Ordering::Relaxed);
        *self.last_stats.write() = Some(stats.clone());

        info!(
            "Kernel '{}' completed in {:?} ({} warps, {} barriers)",
            kernel.name(),
            stats.elapsed,
            stats.warps,
            stats.barriers
        );
        Ok(stats)
    }
}

fn validate_partition(config: &LaunchConfig, row_stride: usize, output_len: usize) -> Result<()> {
    if config.grid_dim.x != 1 {
        return Err(StencilError::InvalidConfig(format!(
            "row-partitioned launch needs a single block column, got grid {}",
            config.grid_dim
        )));
    }
    if config.block_dim.y == 0 || config.grid_dim.y == 0 {
        return Err(StencilError::InvalidConfig(format!(
            "empty launch: grid {} block {}",
            config.grid_dim, config.block_dim
        )));
    }
    if row_stride == 0 {
        return Err(StencilError::InvalidConfig(
            "kernel row stride must be non-zero".to_string(),
        ));
    }
    let expected = config.total_warps() * row_stride;
    if output_len != expected {
        return Err(StencilError::BufferSizeMismatch {
            buffer: "output",
            expected,
            actual: output_len,
        });
    }
    Ok(())
}

/// Poisons the block barrier if the owning warp thread unwinds.
struct PoisonOnUnwind<'a>(&'a BlockBarrier);

impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.poison();
        }
    }
}

fn run_block<K: BlockKernel>(
    kernel: &K,
    config: &LaunchConfig,
    index: usize,
    block_out: &mut [i32],
) -> Result<LaunchStats> {
    let block_id = BlockId::from_linear(index, config.grid_dim);
    let block_dim = config.block_dim;
    let shared = kernel.alloc_shared(block_dim);
    let barrier = BlockBarrier::new(block_dim.y as usize);

    debug!("Running {} with {} warps", block_id, block_dim.y);

    let results: Vec<Result<LaunchStats>> = thread::scope(|s| {
        let handles: Vec<_> = block_out
            .chunks_mut(kernel.row_stride())
            .enumerate()
            .map(|(warp, out_row)| {
                let shared = &shared;
                let barrier = &barrier;
                s.spawn(move || {
                    let _guard = PoisonOnUnwind(barrier);
                    let mut ctx =
                        WarpContext::new(block_id, warp as u32, block_dim, config.grid_dim, barrier);
                    match kernel.run_warp(&mut ctx, shared, out_row) {
                        Ok(()) => Ok(ctx.stats()),
                        Err(e) => {
                            barrier.poison();
                            Err(e)
                        }
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(StencilError::WarpPanicked(block_id.to_string())))
            })
            .collect()
    });

    let mut stats = LaunchStats {
        blocks: 1,
        ..Default::default()
    };
    let mut first_error = None;
    for result in results {
        match result {
            Ok(warp_stats) => stats.merge(&warp_stats),
            // Sibling warps released by the poisoned barrier report a
            // secondary error; keep the one that caused it.
            Err(StencilError::BarrierPoisoned) => {
                first_error.get_or_insert(StencilError::BarrierPoisoned);
            }
            Err(e) => {
                if matches!(first_error, None | Some(StencilError::BarrierPoisoned)) {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => {
            warn!("{} failed: {}", block_id, e);
            Err(e)
        }
        None => Ok(stats),
    }
}
