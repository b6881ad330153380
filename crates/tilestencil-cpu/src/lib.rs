//! # tilestencil CPU backend
//!
//! Executes [`BlockKernel`](tilestencil_core::BlockKernel) launches on the
//! host. Blocks are independent and run on the rayon pool; the warps of one
//! block run as scoped threads that meet at a shared
//! [`BlockBarrier`](tilestencil_core::BlockBarrier), and each warp evaluates
//! its lanes in lockstep.
//!
//! ```ignore
//! use tilestencil_core::prelude::*;
//! use tilestencil_cpu::CpuRuntime;
//!
//! let runtime = CpuRuntime::new();
//! let config = LaunchConfig::for_row_groups(64, SimtConfig::default())?;
//! let stats = runtime.launch(&kernel, &config, &mut output)?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod runtime;

pub use runtime::CpuRuntime;
