//! # tilestencil
//!
//! Five-point stencil kernels that cache a sliding window of the input grid
//! in block-shared memory.
//!
//! Each block owns `warps` consecutive grid rows, one warp per row. A warp
//! walks its row in lane-wide windows; every step it refreshes its tile row,
//! waits at the block barrier, gathers the stencil terms (from the tile, or
//! from global memory across block edges) and writes its results.
//!
//! Three tile layouts are provided, all producing identical output:
//!
//! | Variant | Layout | Index |
//! |---------|--------|-------|
//! | [`TilingVariant::Masked`] | one row per warp, `4 * lanes` wide | `x & (4 * lanes - 1)` |
//! | [`TilingVariant::Modulo`] | one row per warp, `3 * lanes` wide | `x % (3 * lanes)` |
//! | [`TilingVariant::Rotating`] | three lane-wide tiles per warp | rotation index |
//!
//! ## Example
//!
//! ```
//! use tilestencil::prelude::*;
//!
//! let config = StencilConfig::default().with_variant(TilingVariant::Modulo);
//! let input = config.generate_input();
//! let stencil = TiledStencil::from_config(&config);
//! let run = stencil.run(config.variant, &input, config.grid()).unwrap();
//! assert!(check_output(&run.output, &golden_output(&input, config.grid())).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod driver;
pub mod grid;
pub mod halo;
pub mod harness;
pub mod protocol;
pub mod stencil;
pub mod variant;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{InputPattern, StencilConfig};
    pub use crate::grid::GridShape;
    pub use crate::harness::{
        check_output, golden_output, populate_product, populate_random, populate_uniform,
        Mismatch,
    };
    pub use crate::stencil::{StencilRun, TiledStencil};
    pub use crate::variant::TilingVariant;
    pub use tilestencil_core::{ExecutionMode, LaunchStats, SimtConfig, StencilError};
}

pub use config::{InputPattern, StencilConfig};
pub use grid::GridShape;
pub use harness::Mismatch;
pub use stencil::{StencilRun, TiledStencil};
pub use variant::TilingVariant;

pub use tilestencil_core::{ExecutionMode, LaunchStats, Result, SimtConfig, StencilError};
