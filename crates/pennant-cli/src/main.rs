//! Pennant CLI — simulation, benchmarking, and config validation.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pennant")]
#[command(version, about = "Pennant — per-tick compute pipeline for flag cloth")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a flag simulation on the reference device.
    Simulate {
        /// Path to simulation config (TOML). Falls back to the preset.
        #[arg(short, long)]
        config: Option<String>,

        /// Preset used when no config file is given (default, calm, gale).
        #[arg(short, long, default_value = "default")]
        preset: String,

        /// Number of ticks to run.
        #[arg(short, long, default_value_t = 120)]
        ticks: u32,

        /// Write every captured frame to this JSON file.
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run (single_flag, flag_row, dense_flag, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a simulation config file.
    Validate {
        /// Path to config file.
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            preset,
            ticks,
            export,
        } => commands::simulate(config.as_deref(), &preset, ticks, export.as_deref()),
        Commands::Benchmark { scenario, output } => commands::benchmark(&scenario, output.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
