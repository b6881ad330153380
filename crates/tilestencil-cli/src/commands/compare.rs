//! `tilestencil compare` command - Run every variant on the same input and
//! check that they agree with each other and with the golden output.

use colored::Colorize;
use tilestencil::harness::{check_output, golden_output};
use tilestencil::{LaunchStats, StencilConfig, StencilRun, TiledStencil, TilingVariant};

use crate::error::{CliError, CliResult};

use super::{format_duration, print_header};

/// Execute the `compare` command.
pub fn execute(config: &StencilConfig) -> CliResult<()> {
    let grid = config.grid();
    let input = config.generate_input();
    let golden = golden_output(&input, grid);
    let stencil = TiledStencil::from_config(config);

    print_header("Comparing tiling variants", config);

    let mut runs: Vec<(TilingVariant, StencilRun)> = Vec::with_capacity(TilingVariant::ALL.len());
    for variant in TilingVariant::ALL {
        runs.push((variant, stencil.run(variant, &input, grid)?));
    }

    println!(
        "  {:<10} {:>8} {:>10} {:>12} {:>12} {:>12} {:>10} {:>12}",
        "Variant", "Result", "Tile", "Global ld", "Shared ld", "Shared st", "Prefetch", "Elapsed"
    );
    let block_threads = config.lanes as usize * config.warps as usize;
    let mut total = LaunchStats::default();
    for (variant, run) in &runs {
        let status = match check_output(&run.output, &golden) {
            Ok(()) => "ok".bright_green(),
            Err(_) => "MISMATCH".bright_red(),
        };
        let s = &run.stats;
        println!(
            "  {:<10} {:>8} {:>10} {:>12} {:>12} {:>12} {:>10} {:>12}",
            variant.as_str().bright_white(),
            status,
            variant.row_width_factor() * block_threads,
            s.global_loads,
            s.shared_loads,
            s.shared_stores,
            s.prefetches,
            format_duration(s.elapsed)
        );
        total = total.combined(s);
    }
    println!();
    println!(
        "  {} warps over {} launches, {} barriers",
        total.warps.to_string().bright_white(),
        runs.len(),
        total.barriers
    );
    println!();

    for (variant, run) in &runs {
        check_output(&run.output, &golden).map_err(|mismatch| CliError::SelfTest {
            variant: *variant,
            mismatch,
        })?;
    }
    let (first, reference) = &runs[0];
    for (variant, run) in &runs[1..] {
        check_output(&run.output, &reference.output).map_err(|mismatch| {
            CliError::Divergence {
                first: *first,
                second: *variant,
                mismatch,
            }
        })?;
    }

    println!(
        "{} All {} variants produce identical output",
        "✓".bright_green(),
        runs.len()
    );
    Ok(())
}
