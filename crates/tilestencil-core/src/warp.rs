//! Warp lockstep execution context.
//!
//! A warp is a group of lanes sharing one instruction stream. Here each
//! "instruction" is a closure evaluated for every active lane, in lane order,
//! by the thread that owns the warp. Branches are modelled with predication:
//! [`WarpContext::diverge`] narrows the active mask and
//! [`WarpContext::converge`] is the explicit reconvergence point that brings
//! every lane back.
//!
//! ```text
//!   lanes   0 1 2 3 4 5 6 7
//!   active  ■ ■ ■ ■ ■ ■ ■ ■   full mask
//!   diverge ■ ■ ■ ■ ■ ■ ■ □   lane 7 fails the predicate and idles
//!   converge■ ■ ■ ■ ■ ■ ■ ■   reconvergence point
//! ```

use std::cell::Cell;
use std::fmt;

use tracing::trace;

use crate::error::{Result, StencilError};
use crate::memory::SharedTile;
use crate::stats::LaunchStats;
use crate::sync::BlockBarrier;
use crate::types::{BlockId, Dim2, ThreadId};

/// Maximum number of lanes per warp supported by [`LaneMask`].
pub const MAX_LANES: u32 = 64;

/// Bit set of active lanes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneMask(u64);

impl LaneMask {
    /// Mask with the lowest `lanes` bits set.
    ///
    /// # Panics
    ///
    /// Panics if `lanes` exceeds [`MAX_LANES`].
    pub fn full(lanes: u32) -> Self {
        assert!(lanes <= MAX_LANES, "warp of {lanes} lanes exceeds {MAX_LANES}");
        if lanes == MAX_LANES {
            Self(u64::MAX)
        } else {
            Self((1u64 << lanes) - 1)
        }
    }

    /// Mask with no lanes set.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether `lane` is active.
    #[inline]
    pub const fn contains(&self, lane: u32) -> bool {
        lane < MAX_LANES && self.0 & (1u64 << lane) != 0
    }

    /// Number of active lanes.
    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// True when no lane is active.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Return a copy with `lane` set.
    #[inline]
    pub const fn with(self, lane: u32) -> Self {
        Self(self.0 | (1u64 << lane))
    }

    /// Iterate over active lane indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                None
            } else {
                let lane = bits.trailing_zeros();
                bits &= bits - 1;
                Some(lane)
            }
        })
    }
}

impl fmt::Debug for LaneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaneMask({:#x})", self.0)
    }
}

/// Per-warp counters; interior mutability lets lane closures record memory
/// traffic while the context is borrowed immutably.
#[derive(Debug, Default)]
struct Counters {
    steps: Cell<u64>,
    barriers: Cell<u64>,
    prefetches: Cell<u64>,
    divergent_branches: Cell<u64>,
    reconvergences: Cell<u64>,
    global_loads: Cell<u64>,
    shared_loads: Cell<u64>,
    shared_stores: Cell<u64>,
}

#[inline]
fn bump(cell: &Cell<u64>) {
    cell.set(cell.get() + 1);
}

/// Execution context handed to a kernel for one warp of one block.
pub struct WarpContext<'a> {
    block_id: BlockId,
    warp: u32,
    block_dim: Dim2,
    grid_dim: Dim2,
    full: LaneMask,
    active: LaneMask,
    barrier: &'a BlockBarrier,
    counters: Counters,
}

impl<'a> WarpContext<'a> {
    /// Create the context for warp row `warp` of `block_id`.
    ///
    /// `barrier` must be shared by exactly `block_dim.y` warps.
    pub fn new(
        block_id: BlockId,
        warp: u32,
        block_dim: Dim2,
        grid_dim: Dim2,
        barrier: &'a BlockBarrier,
    ) -> Self {
        let full = LaneMask::full(block_dim.x);
        Self {
            block_id,
            warp,
            block_dim,
            grid_dim,
            full,
            active: full,
            barrier,
            counters: Counters::default(),
        }
    }

    // === Identity ===

    /// Block this warp belongs to.
    #[inline]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Warp row within the block (`threadIdx.y` of every lane).
    #[inline]
    pub fn warp_row(&self) -> u32 {
        self.warp
    }

    /// Block dimensions: lanes per warp by warps per block.
    #[inline]
    pub fn block_dim(&self) -> Dim2 {
        self.block_dim
    }

    /// Grid dimensions in blocks.
    #[inline]
    pub fn grid_dim(&self) -> Dim2 {
        self.grid_dim
    }

    /// Lanes per warp.
    #[inline]
    pub fn lane_count(&self) -> u32 {
        self.block_dim.x
    }

    /// True for the first warp row of the block.
    #[inline]
    pub fn is_first_row(&self) -> bool {
        self.warp == 0
    }

    /// True for the last warp row of the block.
    #[inline]
    pub fn is_last_row(&self) -> bool {
        self.warp + 1 == self.block_dim.y
    }

    /// Thread identity of `lane` in this warp.
    #[inline]
    pub fn thread(&self, lane: u32) -> ThreadId {
        ThreadId::new(lane, self.warp)
    }

    // === Predication ===

    /// Currently active lanes.
    #[inline]
    pub fn active_mask(&self) -> LaneMask {
        self.active
    }

    /// True when every lane of the warp is active.
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.active == self.full
    }

    /// Active lanes as thread identities.
    pub fn lanes(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.active.iter().map(move |lane| self.thread(lane))
    }

    /// Execute `f` for every active lane.
    pub fn for_each_lane(&self, mut f: impl FnMut(ThreadId)) {
        for thread in self.lanes() {
            f(thread);
        }
    }

    /// Evaluate `f` for every active lane into a lane-indexed register.
    ///
    /// Inactive lanes hold `T::default()`.
    pub fn map_lanes<T: Default + Clone>(&self, mut f: impl FnMut(ThreadId) -> T) -> Vec<T> {
        let mut register = vec![T::default(); self.block_dim.x as usize];
        for thread in self.lanes() {
            register[thread.lane()] = f(thread);
        }
        register
    }

    /// Enter a branch: lanes failing `pred` idle until the next
    /// [`converge`](Self::converge).
    ///
    /// Returns `true` if any lane remains active.
    pub fn diverge(&mut self, mut pred: impl FnMut(ThreadId) -> bool) -> bool {
        let mut taken = LaneMask::empty();
        for lane in self.active.iter() {
            if pred(self.thread(lane)) {
                taken = taken.with(lane);
            }
        }
        if !taken.is_empty() && taken != self.active {
            bump(&self.counters.divergent_branches);
            trace!(
                block = %self.block_id,
                warp = self.warp,
                taken = taken.count(),
                "divergent branch"
            );
        }
        self.active = taken;
        !taken.is_empty()
    }

    /// Reconvergence point: every lane of the warp resumes.
    pub fn converge(&mut self) {
        self.active = self.full;
        bump(&self.counters.reconvergences);
    }

    // === Synchronization ===

    /// Block-wide barrier (`__syncthreads`).
    ///
    /// All warps of the block must arrive before any proceeds. Reaching it
    /// with masked-off lanes is a kernel bug and is rejected before waiting;
    /// the caller is expected to poison the barrier so that sibling warps
    /// are released.
    pub fn sync_threads(&mut self) -> Result<()> {
        if !self.is_converged() {
            return Err(StencilError::BarrierWhileDiverged {
                warp: self.warp,
                mask: self.active.bits(),
            });
        }
        self.barrier.wait()?;
        bump(&self.counters.barriers);
        Ok(())
    }

    // === Memory ===

    /// Per-lane load from global memory.
    #[inline]
    pub fn load_global(&self, buffer: &[i32], index: usize) -> i32 {
        bump(&self.counters.global_loads);
        buffer[index]
    }

    /// Per-lane load from block-shared memory.
    #[inline]
    pub fn load_shared(&self, tile: &SharedTile, row: usize, col: usize) -> i32 {
        bump(&self.counters.shared_loads);
        tile.load(row, col)
    }

    /// Per-lane store to block-shared memory.
    #[inline]
    pub fn store_shared(&self, tile: &SharedTile, row: usize, col: usize, value: i32) {
        bump(&self.counters.shared_stores);
        tile.store(row, col, value);
    }

    // === Bookkeeping ===

    /// Count one sliding-window step.
    #[inline]
    pub fn record_step(&self) {
        bump(&self.counters.steps);
    }

    /// Count one leading-edge prefetch.
    #[inline]
    pub fn record_prefetch(&self) {
        bump(&self.counters.prefetches);
    }

    /// Snapshot of this warp's counters.
    pub fn stats(&self) -> LaunchStats {
        let c = &self.counters;
        LaunchStats {
            warps: 1,
            steps: c.steps.get(),
            barriers: c.barriers.get(),
            prefetches: c.prefetches.get(),
            divergent_branches: c.divergent_branches.get(),
            reconvergences: c.reconvergences.get(),
            global_loads: c.global_loads.get(),
            shared_loads: c.shared_loads.get(),
            shared_stores: c.shared_stores.get(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for WarpContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarpContext")
            .field("block_id", &self.block_id)
            .field("warp", &self.warp)
            .field("block_dim", &self.block_dim)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_warp(lanes: u32, barrier: &BlockBarrier) -> WarpContext<'_> {
        WarpContext::new(
            BlockId::default(),
            0,
            Dim2::new(lanes, 1),
            Dim2::new(1, 1),
            barrier,
        )
    }

    #[test]
    fn test_lane_mask_full() {
        assert_eq!(LaneMask::full(4).bits(), 0b1111);
        assert_eq!(LaneMask::full(64).bits(), u64::MAX);
        assert_eq!(LaneMask::full(0).count(), 0);
        assert_eq!(LaneMask::full(5).iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    #[should_panic]
    fn test_lane_mask_too_wide() {
        LaneMask::full(65);
    }

    #[test]
    fn test_diverge_and_converge() {
        let barrier = BlockBarrier::new(1);
        let mut warp = single_warp(8, &barrier);

        assert!(warp.diverge(|t| t.x < 7));
        assert_eq!(warp.active_mask().count(), 7);
        assert!(!warp.is_converged());

        let mut seen = Vec::new();
        warp.for_each_lane(|t| seen.push(t.x));
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6]);

        warp.converge();
        assert!(warp.is_converged());

        let stats = warp.stats();
        assert_eq!(stats.divergent_branches, 1);
        assert_eq!(stats.reconvergences, 1);
    }

    #[test]
    fn test_uniform_branch_is_not_divergent() {
        let barrier = BlockBarrier::new(1);
        let mut warp = single_warp(4, &barrier);

        assert!(warp.diverge(|_| true));
        warp.converge();
        assert!(!warp.diverge(|_| false));
        warp.converge();

        assert_eq!(warp.stats().divergent_branches, 0);
        assert_eq!(warp.stats().reconvergences, 2);
    }

    #[test]
    fn test_map_lanes_fills_inactive_with_default() {
        let barrier = BlockBarrier::new(1);
        let mut warp = single_warp(4, &barrier);
        warp.diverge(|t| t.x % 2 == 0);
        let register = warp.map_lanes(|t| t.x as i32 + 10);
        assert_eq!(register, vec![10, 0, 12, 0]);
    }

    #[test]
    fn test_barrier_rejected_while_diverged() {
        let barrier = BlockBarrier::new(1);
        let mut warp = single_warp(4, &barrier);
        warp.diverge(|t| t.x == 0);
        let err = warp.sync_threads().unwrap_err();
        assert_eq!(err, StencilError::BarrierWhileDiverged { warp: 0, mask: 0x1 });

        warp.converge();
        warp.sync_threads().unwrap();
        assert_eq!(warp.stats().barriers, 1);
    }

    #[test]
    fn test_memory_traffic_counted() {
        let barrier = BlockBarrier::new(1);
        let warp = single_warp(4, &barrier);
        let tile = SharedTile::new(1, 4);
        let global = [1, 2, 3, 4];

        warp.for_each_lane(|t| {
            let v = warp.load_global(&global, t.lane());
            warp.store_shared(&tile, 0, t.lane(), v * 2);
        });
        let sum: i32 = warp.map_lanes(|t| warp.load_shared(&tile, 0, t.lane())).iter().sum();

        assert_eq!(sum, 20);
        let stats = warp.stats();
        assert_eq!(stats.global_loads, 4);
        assert_eq!(stats.shared_stores, 4);
        assert_eq!(stats.shared_loads, 4);
    }
}
