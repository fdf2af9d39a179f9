//! Convert command implementation.
//!
//! The convert command:
//! 1. Reads a raw profile envelope from disk
//! 2. Decodes the platform payload
//! 3. Renders the speedscope document
//! 4. Optionally writes the collapsed call trees next to it

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::output::{read_raw_profile, write_json};

/// Arguments for the convert command
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    /// Path to the raw profile envelope JSON
    pub input: PathBuf,

    /// Output path for the speedscope JSON
    pub output: PathBuf,

    /// Optional output path for the collapsed call trees
    pub calltrees: Option<PathBuf>,
}

/// Execute the convert command
///
/// # Errors
/// * Envelope read or parse failures
/// * Payload decode and data integrity failures
/// * File write errors
pub fn execute_convert(args: ConvertArgs) -> Result<()> {
    info!("converting {}", args.input.display());

    let raw = read_raw_profile(&args.input).context("failed to read the raw profile envelope")?;
    let profile = raw.parse().context("failed to decode the profile payload")?;

    let speedscope = profile
        .speedscope()
        .context("failed to render the speedscope document")?;
    debug!(
        "rendered {} thread profiles, {} shared frames",
        speedscope.profiles.len(),
        speedscope.shared.frames.len()
    );
    write_json(&speedscope, &args.output).context("failed to write the speedscope document")?;

    if let Some(calltrees_path) = &args.calltrees {
        let call_trees = profile
            .call_trees()
            .context("failed to build the call trees")?;
        write_json(&call_trees, calltrees_path).context("failed to write the call trees")?;
    }

    info!("wrote {}", args.output.display());
    Ok(())
}
