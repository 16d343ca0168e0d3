//! CLI frontend for the Kernwelt entity-component store.

mod commands;
mod scene;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::run::RunOptions;

#[derive(Parser)]
#[command(
    name = "kw",
    about = "Kernwelt: an entity-component store with change events",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the demo scene and report what happened
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10")]
        ticks: u64,

        /// RNG seed for the generated scene
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Seconds advanced per tick
        #[arg(long, default_value = "1.0")]
        dt: f64,

        /// Number of entities to spawn
        #[arg(short, long, default_value = "12")]
        entities: usize,

        /// World configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the final world snapshot to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print every event (up to a limit)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load a snapshot and list its contents
    Inspect {
        /// Snapshot file written by `kw run --output`
        file: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            ticks,
            seed,
            dt,
            entities,
            config,
            output,
            verbose,
        } => commands::run::run(&RunOptions {
            ticks,
            seed,
            dt,
            entities,
            config,
            output,
            verbose,
        }),
        Commands::Inspect { file } => commands::inspect::run(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
