//! # tilestencil core
//!
//! Core types for running SIMT-style block kernels: launch geometry, warp
//! lockstep execution with explicit reconvergence, block-shared tiles and
//! launch statistics.
//!
//! ## Core Abstractions
//!
//! - [`BlockKernel`] - Trait implemented by kernels, run once per warp
//! - [`WarpContext`] - Lane identity, predication mask, barrier and memory access
//! - [`SharedTile`] - Block-shared scratch array
//! - [`BlockBarrier`] - Poisonable barrier joining the warps of a block
//! - [`LaunchConfig`] - Block and grid extent of a launch
//! - [`LaunchStats`] - Counters collected during a launch

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod launch;
pub mod memory;
pub mod stats;
pub mod sync;
pub mod types;
pub mod warp;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Result, StencilError};
    pub use crate::launch::{BlockKernel, ExecutionMode, LaunchConfig, SimtConfig};
    pub use crate::memory::SharedTile;
    pub use crate::stats::LaunchStats;
    pub use crate::sync::BlockBarrier;
    pub use crate::types::{BlockId, Dim2, ThreadId};
    pub use crate::warp::{LaneMask, WarpContext, MAX_LANES};
}

// Re-exports for convenience
pub use error::{Result, StencilError};
pub use launch::{BlockKernel, ExecutionMode, LaunchConfig, SimtConfig};
pub use memory::SharedTile;
pub use stats::LaunchStats;
pub use sync::BlockBarrier;
pub use types::{BlockId, Dim2, ThreadId};
pub use warp::{LaneMask, WarpContext, MAX_LANES};
