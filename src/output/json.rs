//! JSON file input/output.
//!
//! Reads raw profile envelopes from disk and writes derived artifacts
//! with proper formatting.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::parser::RawProfile;
use crate::utils::error::OutputError;

/// Write a serializable artifact to a JSON file, creating parent
/// directories as needed.
///
/// # Errors
/// * `OutputError::Io` - I/O error during write
/// * `OutputError::Json` - JSON serialization error
/// * `OutputError::Path` - path cannot be created or is invalid
pub fn write_json<T: Serialize>(value: &T, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("writing output to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::Path(format!(
                    "cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::Io)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value).map_err(OutputError::Json)?;

    Ok(())
}

/// Read a raw profile envelope from a JSON file.
pub fn read_raw_profile(input_path: impl AsRef<Path>) -> Result<RawProfile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("reading raw profile from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::Io)?;
    let raw: RawProfile = serde_json::from_reader(file).map_err(OutputError::Json)?;

    debug!(
        "raw profile loaded: platform {}, profile {}",
        raw.platform, raw.profile_id
    );

    Ok(raw)
}

/// Validate that the output path is usable
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::Path("path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::Path(format!(
            "path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
