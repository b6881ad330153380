//! `tilestencil run` command - Run one variant and check it against the
//! golden output.

use colored::Colorize;
use serde::Serialize;
use tilestencil::harness::{check_output, golden_output};
use tilestencil::{GridShape, LaunchStats, StencilConfig, TiledStencil, TilingVariant};

use crate::error::{CliError, CliResult};

use super::{format_duration, print_header};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON for programmatic consumption.
    Json,
}

/// Result of one self-tested run.
#[derive(Debug, Serialize)]
struct RunReport {
    variant: TilingVariant,
    kernel: &'static str,
    grid: GridShape,
    passed: bool,
    stats: LaunchStats,
}

/// Execute the `run` command.
pub fn execute(config: &StencilConfig, format: OutputFormat) -> CliResult<()> {
    let variant = config.variant;
    let grid = config.grid();
    let input = config.generate_input();
    let golden = golden_output(&input, grid);

    if format == OutputFormat::Text {
        print_header(&format!("Running {}", variant.kernel_name()), config);
    }

    let stencil = TiledStencil::from_config(config);
    let run = stencil.run(variant, &input, grid)?;
    let verdict = check_output(&run.output, &golden);

    match format {
        OutputFormat::Text => {
            print_stats(&run.stats);
            if let Err(mismatch) = &verdict {
                println!("  {}", mismatch.to_string().bright_red());
            }
            let status = if verdict.is_ok() {
                "PASSED".bright_green()
            } else {
                "FAILED".bright_red()
            };
            println!("Self test: {}", status.bold());
        }
        OutputFormat::Json => {
            let report = RunReport {
                variant,
                kernel: variant.kernel_name(),
                grid,
                passed: verdict.is_ok(),
                stats: run.stats,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    verdict.map_err(|mismatch| CliError::SelfTest { variant, mismatch })
}

/// Print launch counters.
pub fn print_stats(stats: &LaunchStats) {
    println!("{}:", "Launch Statistics".bright_white().underline());
    let rows = [
        ("Blocks", stats.blocks),
        ("Warps", stats.warps),
        ("Steps", stats.steps),
        ("Barriers", stats.barriers),
        ("Prefetches", stats.prefetches),
        ("Divergent branches", stats.divergent_branches),
        ("Reconvergence points", stats.reconvergences),
        ("Global loads", stats.global_loads),
        ("Shared loads", stats.shared_loads),
        ("Shared stores", stats.shared_stores),
    ];
    for (label, value) in rows {
        println!("  {:<22} {}", label, value.to_string().bright_white());
    }
    println!(
        "  {:<22} {:.1}%",
        "Shared hit ratio",
        stats.shared_hit_ratio() * 100.0
    );
    println!(
        "  {:<22} {}",
        "Elapsed",
        format_duration(stats.elapsed).bright_cyan()
    );
    println!();
}
