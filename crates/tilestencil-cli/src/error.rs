//! Error types for the tilestencil CLI.

use thiserror::Error;
use tilestencil::{Mismatch, StencilError, TilingVariant};

/// CLI result type alias.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error while reading a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Launch rejected or failed.
    #[error(transparent)]
    Stencil(#[from] StencilError),

    /// Kernel output differs from the golden output.
    #[error("Self test failed for {variant}: {mismatch}")]
    SelfTest {
        /// Variant that produced the output.
        variant: TilingVariant,
        /// First difference.
        mismatch: Mismatch,
    },

    /// Two variants disagree on some cell.
    #[error("Variants {first} and {second} disagree: {mismatch}")]
    Divergence {
        /// Reference variant.
        first: TilingVariant,
        /// Variant compared against it.
        second: TilingVariant,
        /// First difference.
        mismatch: Mismatch,
    },

    /// Report serialization failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}
