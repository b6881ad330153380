//! Error types for tilestencil.

use thiserror::Error;

/// Result type alias for tilestencil operations.
pub type Result<T> = std::result::Result<T, StencilError>;

/// Errors raised while configuring or launching a stencil kernel.
///
/// Numeric mismatches against the golden output are not errors; they are
/// reported as values by the host harness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StencilError {
    /// Grid has a zero extent.
    #[error("Grid must be non-empty, got {x_size}x{y_size}")]
    EmptyGrid {
        /// Grid width.
        x_size: usize,
        /// Grid height.
        y_size: usize,
    },

    /// Grid extent is not a multiple of the tiling parameter along an axis.
    #[error("Grid {axis}-extent {size} is not a multiple of {multiple}")]
    GridNotAligned {
        /// Axis name ("x" or "y").
        axis: &'static str,
        /// Offending extent.
        size: usize,
        /// Required multiple (lane count or warp count).
        multiple: usize,
    },

    /// Buffer length disagrees with the grid extent.
    #[error("{buffer} buffer holds {actual} elements, expected {expected}")]
    BufferSizeMismatch {
        /// Which buffer ("input" or "output").
        buffer: &'static str,
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// Invalid launch or SIMT configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown tiling variant name.
    #[error("Unknown tiling variant: {0}")]
    UnknownVariant(String),

    /// Block barrier requested while some lanes of the warp are masked off.
    #[error("Barrier reached by warp {warp} with diverged lanes (mask {mask:#x})")]
    BarrierWhileDiverged {
        /// Warp row within the block.
        warp: u32,
        /// Active lane mask at the barrier.
        mask: u64,
    },

    /// A sibling warp failed and released the block barrier.
    #[error("Block barrier poisoned by a failed warp")]
    BarrierPoisoned,

    /// Sliding-window step phases entered out of order.
    #[error("Step protocol violation: {from} -> {to}")]
    ProtocolViolation {
        /// Phase the warp was in.
        from: &'static str,
        /// Phase the warp tried to enter.
        to: &'static str,
    },

    /// A warp thread panicked during execution.
    #[error("Warp execution failed in {0}")]
    WarpPanicked(String),
}

impl StencilError {
    /// Returns true for errors caused by launch parameters rather than
    /// kernel execution.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StencilError::EmptyGrid { .. }
                | StencilError::GridNotAligned { .. }
                | StencilError::BufferSizeMismatch { .. }
                | StencilError::InvalidConfig(_)
                | StencilError::UnknownVariant(_)
        )
    }
}
