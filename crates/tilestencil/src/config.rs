//! Run configuration.
//!
//! Every field has a default, so a config file only needs the fields it
//! changes:
//!
//! ```toml
//! width = 256
//! height = 128
//! variant = "rotating"
//! pattern = "random"
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use tilestencil_core::{ExecutionMode, Result, SimtConfig};

use crate::grid::GridShape;
use crate::harness;
use crate::variant::TilingVariant;

/// Grid edge length used by simulation runs.
pub const SIM_GRID_SIZE: usize = 64;

/// Grid edge length used by full-size runs.
pub const LARGE_GRID_SIZE: usize = 1024;

/// How the input grid is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPattern {
    /// `x * y`.
    #[default]
    Product,
    /// Every cell holds `fill_value`.
    Uniform,
    /// Seeded pseudo-random values.
    Random,
}

/// Configuration of one stencil run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    /// Grid columns.
    pub width: usize,
    /// Grid rows.
    pub height: usize,
    /// Lanes per warp.
    pub lanes: u32,
    /// Warps per block.
    pub warps: u32,
    /// Tile cache strategy.
    pub variant: TilingVariant,
    /// Input population.
    pub pattern: InputPattern,
    /// Cell value for [`InputPattern::Uniform`].
    pub fill_value: i32,
    /// Seed for [`InputPattern::Random`].
    pub seed: u64,
    /// Block scheduling.
    pub mode: ExecutionMode,
}

impl Default for StencilConfig {
    fn default() -> Self {
        let simt = SimtConfig::default();
        Self {
            width: SIM_GRID_SIZE,
            height: SIM_GRID_SIZE,
            lanes: simt.lanes,
            warps: simt.warps,
            variant: TilingVariant::default(),
            pattern: InputPattern::default(),
            fill_value: 1,
            seed: 0,
            mode: ExecutionMode::default(),
        }
    }
}

impl StencilConfig {
    /// Defaults with the full-size grid.
    pub fn large() -> Self {
        Self::default().with_grid(LARGE_GRID_SIZE, LARGE_GRID_SIZE)
    }

    /// Set the grid extent.
    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set lanes per warp and warps per block.
    pub fn with_simt(mut self, lanes: u32, warps: u32) -> Self {
        self.lanes = lanes;
        self.warps = warps;
        self
    }

    /// Set the tile cache strategy.
    pub fn with_variant(mut self, variant: TilingVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the input pattern.
    pub fn with_pattern(mut self, pattern: InputPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the block scheduling mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Grid extent.
    pub fn grid(&self) -> GridShape {
        GridShape::new(self.width, self.height)
    }

    /// Lane and warp counts.
    pub fn simt(&self) -> SimtConfig {
        SimtConfig::new(self.lanes, self.warps)
    }

    /// Check that the grid can be tiled with these parameters.
    pub fn validate(&self) -> Result<()> {
        self.grid().validate(&self.simt())
    }

    /// Build the input grid.
    pub fn generate_input(&self) -> Vec<i32> {
        let grid = self.grid();
        match self.pattern {
            InputPattern::Product => harness::populate_product(grid),
            InputPattern::Uniform => harness::populate_uniform(grid, self.fill_value),
            InputPattern::Random => harness::populate_random(grid, self.seed),
        }
    }
}
