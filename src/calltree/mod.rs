//! Call-tree construction, simplification and per-function aggregation.

pub mod builder;
pub mod functions;
pub mod node;

pub use functions::{collect_functions, CallTreeFunction};
pub use node::Node;
