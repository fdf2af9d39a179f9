//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the library components to perform user tasks.

pub mod convert;
pub mod functions;

pub use convert::{execute_convert, ConvertArgs};
pub use functions::{execute_functions, FunctionsArgs};
