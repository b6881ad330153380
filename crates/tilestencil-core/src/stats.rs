//! Launch statistics.
//!
//! Counters are gathered per warp while a launch executes and merged into a
//! single [`LaunchStats`] when the launch completes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Aggregated counters for one kernel launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchStats {
    /// Blocks executed.
    pub blocks: u64,
    /// Warps executed.
    pub warps: u64,
    /// Sliding-window steps, summed over warps.
    pub steps: u64,
    /// Block barrier arrivals, summed over warps.
    pub barriers: u64,
    /// Leading-edge prefetches issued, summed over warps.
    pub prefetches: u64,
    /// Branches where only part of the active lanes took the path.
    pub divergent_branches: u64,
    /// Explicit reconvergence points reached.
    pub reconvergences: u64,
    /// Per-lane global memory loads.
    pub global_loads: u64,
    /// Per-lane shared memory loads.
    pub shared_loads: u64,
    /// Per-lane shared memory stores.
    pub shared_stores: u64,
    /// Wall-clock time of the launch.
    pub elapsed: Duration,
}

impl LaunchStats {
    /// Fold another set of counters into this one.
    ///
    /// Elapsed time is not summed; launches set it once at the end.
    pub fn merge(&mut self, other: &LaunchStats) {
        self.blocks += other.blocks;
        self.warps += other.warps;
        self.steps += other.steps;
        self.barriers += other.barriers;
        self.prefetches += other.prefetches;
        self.divergent_branches += other.divergent_branches;
        self.reconvergences += other.reconvergences;
        self.global_loads += other.global_loads;
        self.shared_loads += other.shared_loads;
        self.shared_stores += other.shared_stores;
    }

    /// Merge two snapshots into a new one.
    pub fn combined(mut self, other: &LaunchStats) -> Self {
        self.merge(other);
        self
    }

    /// Fraction of memory loads served from shared memory.
    pub fn shared_hit_ratio(&self) -> f64 {
        let total = self.global_loads + self.shared_loads;
        if total == 0 {
            0.0
        } else {
            self.shared_loads as f64 / total as f64
        }
    }
}
