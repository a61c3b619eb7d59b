//! twophase CLI
//!
//! Command-line driver for the two-phase locking simulator.
//!
//! # Commands
//!
//! - `simulate` - Run a generated workload, one thread per command
//! - `check-log` - Parse a transaction log and summarize it

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Two-phase locking simulator tools.
#[derive(Parser)]
#[command(name = "twophase")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generated deadlock-free workload
    Simulate {
        /// Number of transactions
        #[arg(short, long, default_value = "8")]
        transactions: usize,

        /// Maximum reads/writes per transaction
        #[arg(short = 'a', long, default_value = "4")]
        max_accesses: usize,

        /// Number of objects in the store
        #[arg(short, long, default_value = "8")]
        objects: usize,

        /// Initial value of every object
        #[arg(short, long, default_value = "0")]
        initial: i64,

        /// Fraction of read-only transactions
        #[arg(long, default_value = "0.5")]
        read_only_ratio: f64,

        /// Fraction of transactions that abort
        #[arg(long, default_value = "0.2")]
        abort_ratio: f64,

        /// Workload generator seed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Write the transaction log to this file instead of stdout
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse a transaction log and summarize it
    CheckLog {
        /// Log file to check
        path: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            transactions,
            max_accesses,
            objects,
            initial,
            read_only_ratio,
            abort_ratio,
            seed,
            log,
            format,
        } => {
            let options = commands::simulate::SimulateOptions {
                transactions,
                max_accesses,
                objects,
                initial,
                read_only_ratio,
                abort_ratio,
                seed,
                log,
            };
            commands::simulate::run(&options, &format)?;
        }
        Commands::CheckLog { path, format } => {
            commands::check_log::run(&path, &format)?;
        }
        Commands::Version => {
            println!("twophase CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("twophase core v{}", twophase_core::VERSION);
        }
    }

    Ok(())
}
