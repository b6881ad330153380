//! `tilestencil bench` command - Time repeated launches of each variant.

use std::time::{Duration, Instant};

use colored::Colorize;
use serde::Serialize;
use tilestencil::{StencilConfig, TiledStencil, TilingVariant};
use tracing::info;

use crate::error::CliResult;

use super::{format_duration, print_header};

/// Timing summary for one variant.
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    /// Variant measured.
    pub variant: TilingVariant,
    /// Measured iterations.
    pub iterations: u32,
    /// Fastest launch.
    pub min: Duration,
    /// Slowest launch.
    pub max: Duration,
    /// Mean launch time.
    pub mean: Duration,
    /// Median launch time.
    pub median: Duration,
    /// Cells per second at the mean.
    pub cells_per_second: f64,
}

impl BenchResult {
    fn from_samples(variant: TilingVariant, cells: usize, mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let iterations = samples.len() as u32;
        let total: Duration = samples.iter().sum();
        let mean = total / iterations.max(1);
        let cells_per_second = if mean.is_zero() {
            0.0
        } else {
            cells as f64 / mean.as_secs_f64()
        };
        Self {
            variant,
            iterations,
            min: samples.first().copied().unwrap_or_default(),
            max: samples.last().copied().unwrap_or_default(),
            mean,
            median: samples.get(samples.len() / 2).copied().unwrap_or_default(),
            cells_per_second,
        }
    }
}

/// Execute the `bench` command.
pub fn execute(
    config: &StencilConfig,
    variants: &[TilingVariant],
    iterations: u32,
    warmup: u32,
    json: bool,
) -> CliResult<()> {
    let grid = config.grid();
    let input = config.generate_input();
    let stencil = TiledStencil::from_config(config);
    let mut output = vec![0; grid.len()];

    if !json {
        print_header(
            &format!("Benchmarking {} iterations (+ {} warmup)", iterations, warmup),
            config,
        );
    }

    let mut results = Vec::with_capacity(variants.len());
    for &variant in variants {
        for _ in 0..warmup {
            stencil.run_into(variant, &input, grid, &mut output)?;
        }
        let mut samples = Vec::with_capacity(iterations as usize);
        for _ in 0..iterations {
            let start = Instant::now();
            stencil.run_into(variant, &input, grid, &mut output)?;
            samples.push(start.elapsed());
        }
        let result = BenchResult::from_samples(variant, grid.len(), samples);
        info!("{}: mean {:?}", variant, result.mean);
        results.push(result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!(
        "  {:<10} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Variant", "Min", "Median", "Mean", "Max", "Mcells/s"
    );
    for r in &results {
        println!(
            "  {:<10} {:>12} {:>12} {:>12} {:>12} {:>14}",
            r.variant.as_str().bright_white(),
            format_duration(r.min).bright_green(),
            format_duration(r.median),
            format_duration(r.mean),
            format_duration(r.max).bright_red(),
            format!("{:.2}", r.cells_per_second / 1e6).bright_cyan()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_samples() {
        let samples = vec![
            Duration::from_millis(3),
            Duration::from_millis(1),
            Duration::from_millis(2),
        ];
        let r = BenchResult::from_samples(TilingVariant::Masked, 1000, samples);
        assert_eq!(r.min, Duration::from_millis(1));
        assert_eq!(r.max, Duration::from_millis(3));
        assert_eq!(r.median, Duration::from_millis(2));
        assert_eq!(r.mean, Duration::from_millis(2));
        assert!((r.cells_per_second - 500_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_samples() {
        let r = BenchResult::from_samples(TilingVariant::Modulo, 10, Vec::new());
        assert_eq!(r.iterations, 0);
        assert_eq!(r.mean, Duration::ZERO);
        assert_eq!(r.cells_per_second, 0.0);
    }
}
