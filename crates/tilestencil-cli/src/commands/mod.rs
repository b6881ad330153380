//! CLI command implementations.

pub mod bench;
pub mod compare;
pub mod run;

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use tilestencil::{ExecutionMode, InputPattern, StencilConfig, StencilError, TilingVariant};
use tracing::debug;

use crate::error::CliResult;

/// Grid and SIMT options shared by every command. Flags override the config
/// file, which overrides the defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Grid width in cells
    #[arg(long)]
    pub width: Option<usize>,

    /// Grid height in cells
    #[arg(long)]
    pub height: Option<usize>,

    /// Use the 1024x1024 grid
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub large: bool,

    /// Lanes per warp
    #[arg(long)]
    pub lanes: Option<u32>,

    /// Warps per block
    #[arg(long)]
    pub warps: Option<u32>,

    /// Input pattern (product, uniform, random)
    #[arg(long, value_parser = parse_pattern)]
    pub pattern: Option<InputPattern>,

    /// Cell value for the uniform pattern
    #[arg(long)]
    pub fill: Option<i32>,

    /// Seed for the random pattern
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run blocks one after another instead of on the thread pool
    #[arg(long)]
    pub sequential: bool,
}

impl GridArgs {
    /// Apply the flags on top of `config`.
    pub fn apply(&self, mut config: StencilConfig) -> StencilConfig {
        if self.large {
            let large = StencilConfig::large();
            config = config.with_grid(large.width, large.height);
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(lanes) = self.lanes {
            config.lanes = lanes;
        }
        if let Some(warps) = self.warps {
            config.warps = warps;
        }
        if let Some(pattern) = self.pattern {
            config.pattern = pattern;
        }
        if let Some(fill) = self.fill {
            config.fill_value = fill;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.sequential {
            config.mode = ExecutionMode::Sequential;
        }
        config
    }
}

/// Parse a tiling variant name.
pub fn parse_variant(s: &str) -> Result<TilingVariant, StencilError> {
    s.parse()
}

/// Parse an input pattern name.
pub fn parse_pattern(s: &str) -> Result<InputPattern, String> {
    match s.trim().to_lowercase().as_str() {
        "product" | "xy" => Ok(InputPattern::Product),
        "uniform" | "ones" => Ok(InputPattern::Uniform),
        "random" | "rand" => Ok(InputPattern::Random),
        other => Err(format!(
            "Unknown pattern '{}'. Valid options: product, uniform, random",
            other
        )),
    }
}

/// Load a TOML config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> CliResult<StencilConfig> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config: StencilConfig = toml::from_str(&content)?;
            debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(StencilConfig::default()),
    }
}

/// Print the run parameters.
pub fn print_header(title: &str, config: &StencilConfig) {
    println!("{} {}", "→".bright_cyan(), title.bright_white());
    println!(
        "  {} Grid: {}",
        "•".dimmed(),
        format!("{}x{}", config.width, config.height).bright_yellow()
    );
    println!(
        "  {} Block: {} lanes x {} warps",
        "•".dimmed(),
        config.lanes.to_string().bright_yellow(),
        config.warps.to_string().bright_yellow()
    );
    println!(
        "  {} Input: {:?}, mode: {:?}",
        "•".dimmed(),
        config.pattern,
        config.mode
    );
    println!();
}

/// Format a duration with a unit suited to its size.
pub fn format_duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2} µs", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = GridArgs {
            width: Some(128),
            lanes: Some(8),
            pattern: Some(InputPattern::Random),
            sequential: true,
            ..Default::default()
        };
        let config = args.apply(StencilConfig::default());
        assert_eq!(config.width, 128);
        assert_eq!(config.height, 64);
        assert_eq!(config.lanes, 8);
        assert_eq!(config.pattern, InputPattern::Random);
        assert_eq!(config.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_large_grid() {
        let args = GridArgs {
            large: true,
            ..Default::default()
        };
        let config = args.apply(StencilConfig::default());
        assert_eq!((config.width, config.height), (1024, 1024));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_variant("c").unwrap(), TilingVariant::Rotating);
        assert!(parse_variant("hexagonal").is_err());
        assert_eq!(parse_pattern("Uniform").unwrap(), InputPattern::Uniform);
        assert!(parse_pattern("stripes").is_err());
    }

    #[test]
    fn test_toml_config() {
        let config: StencilConfig = toml::from_str(
            r#"
            width = 256
            variant = "modulo"
            mode = "sequential"
            "#,
        )
        .unwrap();
        assert_eq!(config.width, 256);
        assert_eq!(config.variant, TilingVariant::Modulo);
        assert_eq!(config.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500 ns");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50 ms");
    }
}
