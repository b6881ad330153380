//! Launch entry points.

use tilestencil_core::{ExecutionMode, LaunchConfig, LaunchStats, Result, SimtConfig};
use tilestencil_cpu::CpuRuntime;
use tracing::debug;

use crate::cache::{MaskedRingTile, ModuloTile, RotatingTripleTile, TileCache};
use crate::config::StencilConfig;
use crate::driver::StencilKernel;
use crate::grid::GridShape;
use crate::variant::TilingVariant;

/// Output and statistics of one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StencilRun {
    /// Output grid.
    pub output: Vec<i32>,
    /// Launch counters.
    pub stats: LaunchStats,
}

/// Runs tiled stencil kernels on the CPU SIMT backend.
///
/// # Example
///
/// ```
/// use tilestencil::prelude::*;
///
/// let grid = GridShape::new(8, 4);
/// let input = populate_uniform(grid, 1);
/// let stencil = TiledStencil::new(SimtConfig::new(4, 2));
/// let run = stencil.run(TilingVariant::Rotating, &input, grid).unwrap();
/// assert_eq!(run.output[grid.offset(1, 1)], 5);
/// ```
#[derive(Default)]
pub struct TiledStencil {
    runtime: CpuRuntime,
    simt: SimtConfig,
    mode: ExecutionMode,
}

impl TiledStencil {
    /// Stencil launcher for blocks of `simt.warps` warps of `simt.lanes` lanes.
    pub fn new(simt: SimtConfig) -> Self {
        Self {
            runtime: CpuRuntime::new(),
            simt,
            mode: ExecutionMode::default(),
        }
    }

    /// Launcher matching a run configuration.
    pub fn from_config(config: &StencilConfig) -> Self {
        Self::new(config.simt()).with_mode(config.mode)
    }

    /// Set the block scheduling mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// SIMT shape of every launch.
    pub fn simt(&self) -> SimtConfig {
        self.simt
    }

    /// Underlying runtime.
    pub fn runtime(&self) -> &CpuRuntime {
        &self.runtime
    }

    /// Run `variant` over `input` into a fresh output grid.
    pub fn run(&self, variant: TilingVariant, input: &[i32], grid: GridShape) -> Result<StencilRun> {
        let mut output = vec![0; grid.len()];
        let stats = self.run_into(variant, input, grid, &mut output)?;
        Ok(StencilRun { output, stats })
    }

    /// Run `variant` over `input`, writing every cell of `output`.
    pub fn run_into(
        &self,
        variant: TilingVariant,
        input: &[i32],
        grid: GridShape,
        output: &mut [i32],
    ) -> Result<LaunchStats> {
        match variant {
            TilingVariant::Masked => self.run_with::<MaskedRingTile>(input, grid, output),
            TilingVariant::Modulo => self.run_with::<ModuloTile>(input, grid, output),
            TilingVariant::Rotating => self.run_with::<RotatingTripleTile>(input, grid, output),
        }
    }

    /// Run the kernel with tile cache `C`.
    pub fn run_with<C: TileCache>(
        &self,
        input: &[i32],
        grid: GridShape,
        output: &mut [i32],
    ) -> Result<LaunchStats> {
        grid.validate(&self.simt)?;
        C::validate(&self.simt)?;
        grid.check_buffer("input", input)?;
        grid.check_buffer("output", output)?;

        let launch = LaunchConfig::for_row_groups(grid.y_size, self.simt)?.with_mode(self.mode);
        debug!(
            variant = %C::VARIANT,
            x_size = grid.x_size,
            y_size = grid.y_size,
            blocks = launch.total_blocks(),
            "launching tiled stencil"
        );
        let kernel = StencilKernel::<C>::new(input, grid);
        self.runtime.launch(&kernel, &launch, output)
    }
}

impl std::fmt::Debug for TiledStencil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiledStencil")
            .field("simt", &self.simt)
            .field("mode", &self.mode)
            .field("launches", &self.runtime.total_launched())
            .finish()
    }
}
