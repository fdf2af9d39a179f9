//! File output for derived artifacts.

pub mod json;

pub use json::{read_raw_profile, write_json};
