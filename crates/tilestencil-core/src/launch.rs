//! Launch configuration and the block kernel contract.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StencilError};
use crate::types::Dim2;
use crate::warp::{WarpContext, MAX_LANES};

/// Lanes per warp and warps per block of the SIMT device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimtConfig {
    /// Lanes per warp (`SIMTLanes`).
    pub lanes: u32,
    /// Warps per block (`SIMTWarps`); each warp owns one grid row.
    pub warps: u32,
}

impl Default for SimtConfig {
    fn default() -> Self {
        Self { lanes: 32, warps: 4 }
    }
}

impl SimtConfig {
    /// Create a SIMT configuration.
    pub const fn new(lanes: u32, warps: u32) -> Self {
        Self { lanes, warps }
    }

    /// Check the device limits.
    pub fn validate(&self) -> Result<()> {
        if self.lanes == 0 || self.lanes > MAX_LANES {
            return Err(StencilError::InvalidConfig(format!(
                "lanes must be in 1..={MAX_LANES}, got {}",
                self.lanes
            )));
        }
        if self.warps == 0 {
            return Err(StencilError::InvalidConfig(
                "warps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Block extent: one warp of `lanes` lanes per row.
    pub const fn block_dim(&self) -> Dim2 {
        Dim2::new(self.lanes, self.warps)
    }
}

/// How the backend schedules blocks.
///
/// Warps of one block always run concurrently since they meet at barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Blocks run on the rayon thread pool.
    #[default]
    Parallel,
    /// Blocks run one after another.
    Sequential,
}

/// Block and grid extent for one launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Threads per block (lanes by warps).
    pub block_dim: Dim2,
    /// Blocks per grid.
    pub grid_dim: Dim2,
    /// Block scheduling.
    pub mode: ExecutionMode,
}

impl LaunchConfig {
    /// Create a launch configuration.
    pub fn new(block_dim: Dim2, grid_dim: Dim2) -> Self {
        Self {
            block_dim,
            grid_dim,
            mode: ExecutionMode::default(),
        }
    }

    /// One block per group of `simt.warps` rows, a single block column.
    ///
    /// `rows` must be a non-zero multiple of the warp count.
    pub fn for_row_groups(rows: usize, simt: SimtConfig) -> Result<Self> {
        simt.validate()?;
        let warps = simt.warps as usize;
        if rows == 0 || rows % warps != 0 {
            return Err(StencilError::GridNotAligned {
                axis: "y",
                size: rows,
                multiple: warps,
            });
        }
        let groups = u32::try_from(rows / warps).map_err(|_| {
            StencilError::InvalidConfig(format!("{rows} rows exceed the grid limit"))
        })?;
        Ok(Self::new(simt.block_dim(), Dim2::new(1, groups)))
    }

    /// Set the block scheduling mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of blocks in the grid.
    pub fn total_blocks(&self) -> usize {
        self.grid_dim.volume()
    }

    /// Number of warps across all blocks.
    pub fn total_warps(&self) -> usize {
        self.total_blocks() * self.block_dim.y as usize
    }
}

/// A kernel executed warp by warp over a row-partitioned output.
///
/// The backend allocates [`BlockKernel::Shared`] once per block and hands
/// every warp of that block the same instance. Each warp receives exclusive
/// access to its own `row_stride()` elements of the output, so distinct
/// warps can never write the same cell.
pub trait BlockKernel: Sync {
    /// Block-shared scratch storage.
    type Shared: Sync;

    /// Kernel name for logging.
    fn name(&self) -> &str;

    /// Output elements owned by one warp.
    fn row_stride(&self) -> usize;

    /// Allocate the shared storage of one block.
    fn alloc_shared(&self, block_dim: Dim2) -> Self::Shared;

    /// Run the kernel body for one warp.
    fn run_warp(
        &self,
        warp: &mut WarpContext<'_>,
        shared: &Self::Shared,
        out_row: &mut [i32],
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simt_defaults() {
        let simt = SimtConfig::default();
        assert_eq!(simt.lanes, 32);
        assert_eq!(simt.warps, 4);
        assert!(simt.validate().is_ok());
    }

    #[test]
    fn test_simt_limits() {
        assert!(SimtConfig::new(0, 4).validate().is_err());
        assert!(SimtConfig::new(65, 4).validate().is_err());
        assert!(SimtConfig::new(64, 0).validate().is_err());
        assert!(SimtConfig::new(64, 1).validate().is_ok());
    }

    #[test]
    fn test_row_group_geometry() {
        let launch = LaunchConfig::for_row_groups(64, SimtConfig::new(32, 4)).unwrap();
        assert_eq!(launch.block_dim, Dim2::new(32, 4));
        assert_eq!(launch.grid_dim, Dim2::new(1, 16));
        assert_eq!(launch.total_blocks(), 16);
        assert_eq!(launch.total_warps(), 64);
        assert_eq!(launch.mode, ExecutionMode::Parallel);
    }

    #[test]
    fn test_row_group_alignment() {
        let err = LaunchConfig::for_row_groups(10, SimtConfig::new(32, 4)).unwrap_err();
        assert_eq!(
            err,
            StencilError::GridNotAligned {
                axis: "y",
                size: 10,
                multiple: 4
            }
        );
        assert!(LaunchConfig::for_row_groups(0, SimtConfig::default()).is_err());
    }
}
