//! tilestencil CLI - Run, verify, compare and time the tiled stencil kernels.
//!
//! # Commands
//!
//! - `tilestencil run` - Run one variant and self-test it against the golden output
//! - `tilestencil compare` - Run every variant and check they agree
//! - `tilestencil bench` - Time repeated launches
//!
//! # Examples
//!
//! ```bash
//! # Self test of the rotating triple buffer on the 1024x1024 grid
//! tilestencil run --variant rotating --large
//!
//! # All variants on a random 256x128 grid, 16 lanes per warp
//! tilestencil compare --width 256 --height 128 --lanes 16 --pattern random
//!
//! # Settings from a file, flags still override
//! tilestencil --config stencil.toml bench --iterations 50
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tilestencil::TilingVariant;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::run::OutputFormat;
use commands::{bench, compare, load_config, parse_variant, run, GridArgs};

/// tilestencil - shared-memory tiled five-point stencil
#[derive(Parser)]
#[command(name = "tilestencil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with run settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one tiling variant and check it against the golden output
    Run {
        #[command(flatten)]
        grid: GridArgs,

        /// Tiling variant (masked, modulo, rotating)
        #[arg(long, value_parser = parse_variant)]
        variant: Option<TilingVariant>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run every tiling variant and check that they agree
    Compare {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// Time repeated launches
    Bench {
        #[command(flatten)]
        grid: GridArgs,

        /// Variant to time (default: all)
        #[arg(long, value_parser = parse_variant)]
        variant: Option<TilingVariant>,

        /// Measured iterations per variant
        #[arg(short, long, default_value = "20")]
        iterations: u32,

        /// Untimed iterations per variant
        #[arg(long, default_value = "2")]
        warmup: u32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let base = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run {
            grid,
            variant,
            format,
        } => {
            let mut config = grid.apply(base);
            if let Some(variant) = variant {
                config.variant = variant;
            }
            run::execute(&config, format)
        }

        Commands::Compare { grid } => compare::execute(&grid.apply(base)),

        Commands::Bench {
            grid,
            variant,
            iterations,
            warmup,
            json,
        } => {
            let variants = match variant {
                Some(v) => vec![v],
                None => TilingVariant::ALL.to_vec(),
            };
            bench::execute(&grid.apply(base), &variants, iterations, warmup, json)
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "tilestencil",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
