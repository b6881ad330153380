//! Tile cache strategy selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tilestencil_core::StencilError;

/// The three shared-memory tiling strategies.
///
/// All variants produce bit-identical output for the same input; they differ
/// in shared-memory footprint, stores per step and index arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TilingVariant {
    /// One row per warp, 4x lanes wide, indexed with a bitmask.
    #[serde(alias = "a")]
    #[default]
    Masked,
    /// One row per warp, 3x lanes wide, indexed modulo the width; refreshes
    /// the current and next slice every step.
    #[serde(alias = "b")]
    Modulo,
    /// Three lane-wide tiles per warp rotated as left/middle/right.
    #[serde(alias = "c")]
    Rotating,
}

impl TilingVariant {
    /// All variants, in declaration order.
    pub const ALL: [TilingVariant; 3] = [
        TilingVariant::Masked,
        TilingVariant::Modulo,
        TilingVariant::Rotating,
    ];

    /// Short name used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TilingVariant::Masked => "masked",
            TilingVariant::Modulo => "modulo",
            TilingVariant::Rotating => "rotating",
        }
    }

    /// Kernel name reported in logs and statistics.
    pub fn kernel_name(&self) -> &'static str {
        match self {
            TilingVariant::Masked => "stencil_masked_ring",
            TilingVariant::Modulo => "stencil_modulo_tile",
            TilingVariant::Rotating => "stencil_rotating_triple",
        }
    }

    /// Shared-memory cells per warp row, as a multiple of the lane count.
    pub fn row_width_factor(&self) -> usize {
        match self {
            TilingVariant::Masked => 4,
            TilingVariant::Modulo | TilingVariant::Rotating => 3,
        }
    }
}

impl fmt::Display for TilingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TilingVariant {
    type Err = StencilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "masked" | "masked-ring" | "a" => Ok(TilingVariant::Masked),
            "modulo" | "mod" | "b" => Ok(TilingVariant::Modulo),
            "rotating" | "triple" | "c" => Ok(TilingVariant::Rotating),
            _ => Err(StencilError::UnknownVariant(s.to_string())),
        }
    }
}
