//! Stackscope CLI
//!
//! Converts raw profiling payloads into speedscope documents and
//! per-function call-tree summaries.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use stackscope::commands::{execute_convert, execute_functions, ConvertArgs, FunctionsArgs};
use stackscope::output::read_raw_profile;
use stackscope::parser::ProfileData;

/// Stackscope - profile normalization and call-tree analysis
#[derive(Parser, Debug)]
#[command(name = "stackscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a raw profile envelope into a speedscope document
    Convert {
        /// Path to the raw profile envelope JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the speedscope JSON
        #[arg(short, long, default_value = "speedscope.json")]
        output: PathBuf,

        /// Also write the collapsed call trees to this path
        #[arg(long)]
        calltrees: Option<PathBuf>,
    },

    /// Rank the profile's functions by total self time
    Functions {
        /// Path to the raw profile envelope JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Number of functions to print
        #[arg(long, default_value = "20")]
        top: usize,

        /// Only list application functions
        #[arg(long)]
        application_only: bool,
    },

    /// Validate a raw profile envelope
    Validate {
        /// Path to the raw profile envelope JSON
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            calltrees,
        } => {
            execute_convert(ConvertArgs {
                input,
                output,
                calltrees,
            })?;
        }

        Commands::Functions {
            input,
            top,
            application_only,
        } => {
            execute_functions(FunctionsArgs {
                input,
                top,
                application_only,
            })?;
        }

        Commands::Validate { file } => {
            validate_envelope(file)?;
        }
    }

    Ok(())
}

/// Validate a raw profile envelope file
fn validate_envelope(file_path: PathBuf) -> Result<()> {
    println!("Validating envelope: {}", file_path.display());

    let raw = read_raw_profile(&file_path)?;
    let profile = raw.parse()?;

    println!("✓ Valid profile payload");
    println!("  Platform: {}", profile.platform);
    println!("  Profile: {}", profile.profile_id);
    println!("  Project: {}", profile.project_id);
    println!("  Duration: {}ns", profile.duration_ns);
    match &profile.data {
        ProfileData::Android(android) => {
            println!("  Methods: {}", android.methods.len());
            println!("  Events: {}", android.events.len());
            println!("  Threads: {}", android.threads.len());
        }
        ProfileData::Cocoa(cocoa) => {
            println!("  Samples: {}", cocoa.samples.len());
            println!("  Queues: {}", cocoa.queue_metadata.len());
        }
        ProfileData::Python(python) => {
            println!("  Samples: {}", python.samples.len());
            println!("  Frames: {}", python.frames.len());
        }
        ProfileData::Rust(rust) => {
            println!("  Samples: {}", rust.samples.len());
        }
    }

    Ok(())
}
