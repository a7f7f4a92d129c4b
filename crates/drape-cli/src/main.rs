//! drape CLI: simulation, benchmarking, inspection and validation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "drape")]
#[command(version, about = "drape: implicit cloth simulation with barrier contact")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a scene file.
    Simulate {
        /// Path to the scene description (TOML).
        #[arg(short, long, default_value = "scene.toml")]
        config: PathBuf,

        /// Write a JSON frame recording here (overrides the scene file).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a final-state snapshot here (overrides the scene file).
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Write telemetry events as JSON Lines.
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Run the benchmark scenarios.
    Benchmark {
        /// Scenario to run (ground_drape, hanging_sheet, inclined_slide,
        /// free_fall, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Material preset (cotton, silk, denim, leather, rubber).
        #[arg(short, long)]
        material: Option<String>,
    },

    /// Inspect a state snapshot file.
    Inspect {
        /// Path to snapshot file.
        path: PathBuf,
    },

    /// Validate a scene (.toml) or frame recording (.json).
    Validate {
        /// Path to the file.
        path: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Simulate {
            config,
            output,
            snapshot,
            events,
        } => commands::simulate(&config, output, snapshot, events),
        Commands::Benchmark {
            scenario,
            output,
            material,
        } => commands::benchmark(&scenario, output.as_deref(), material.as_deref()),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
