//! Shared input schema for sampled profiles.
//!
//! The cocoa and rust payloads carry the same sample/frame shape; python
//! reuses the sample timing fields but references frames by table index.
//! Missing string fields deserialize to empty strings so the rest of the
//! pipeline never deals with optionals.

use serde::{Deserialize, Serialize};

use crate::utils::config::MAIN_FUNCTION;

/// A single stack frame as captured by a sampling profiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub function: String,

    /// Image path of the binary the frame belongs to
    #[serde(default)]
    pub package: String,

    #[serde(default, alias = "file")]
    pub filename: String,

    #[serde(default, alias = "abs_path")]
    pub path: String,

    #[serde(default, alias = "line")]
    pub lineno: u32,

    #[serde(default)]
    pub instruction_addr: String,

    /// Address of the enclosing symbol, when symbolication resolved one
    #[serde(default)]
    pub sym_addr: String,

    /// Symbolication status reported by the processing pipeline
    #[serde(default)]
    pub status: String,

    /// Set for frames synthesized from inline debug info
    #[serde(default, skip_serializing)]
    pub inline: bool,
}

impl Frame {
    /// Deduplication key for frames from native platforms: the symbol
    /// address when symbolication resolved one, the instruction address
    /// otherwise.
    pub fn address(&self) -> &str {
        if !self.sym_addr.is_empty() {
            &self.sym_addr
        } else {
            &self.instruction_addr
        }
    }

    /// Whether a rust frame was inlined into its caller: symbolication
    /// succeeded but could not attach a symbol address.
    pub fn is_rust_inline(&self) -> bool {
        self.status == "symbolicated" && self.sym_addr.is_empty()
    }

    /// Locate the application entry point in a cocoa stack.
    ///
    /// Returns `(true, offset)` when this frame is the entry point, where
    /// `offset` adjusts the frame-table index inside an inlined group:
    /// `UIApplicationMain` is reported one slot late by the iOS SDK, so its
    /// offset is -1.
    pub fn is_cocoa_main(&self) -> (bool, i64) {
        if self.status != "symbolicated" {
            (false, 0)
        } else if self.function == MAIN_FUNCTION {
            (true, 0)
        } else if self.function == "UIApplicationMain" {
            (true, -1)
        } else {
            (false, 0)
        }
    }

    /// Locate the application entry point in a rust stack.
    pub fn is_rust_main(&self) -> bool {
        self.status == "symbolicated"
            && (self.function == MAIN_FUNCTION || self.function.ends_with("::main"))
    }
}

/// A stack snapshot on one thread. Frames are stored leaf-first, the
/// order the unwinder walked them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub frames: Vec<Frame>,

    #[serde(default)]
    pub queue_address: String,

    pub relative_timestamp_ns: u64,

    pub thread_id: u64,

    #[serde(default)]
    pub thread_name: String,
}

/// Per-thread metadata reported alongside cocoa samples.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub priority: Option<u32>,
}

/// Per-queue metadata reported alongside cocoa samples.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueMetadata {
    #[serde(default)]
    pub label: String,
}

impl QueueMetadata {
    /// The main thread runs the queue with a well-known label.
    pub fn labeled_as_main_thread(&self) -> bool {
        self.label == crate::utils::config::MAIN_THREAD_QUEUE_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_address_prefers_sym_addr() {
        let frame = Frame {
            sym_addr: "0x1000".to_string(),
            instruction_addr: "0x1024".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.address(), "0x1000");

        let frame = Frame {
            instruction_addr: "0x1024".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.address(), "0x1024");
    }

    #[test]
    fn test_cocoa_main_detection() {
        let frame = Frame {
            function: "main".to_string(),
            status: "symbolicated".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.is_cocoa_main(), (true, 0));

        let frame = Frame {
            function: "UIApplicationMain".to_string(),
            status: "symbolicated".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.is_cocoa_main(), (true, -1));

        // unsymbolicated frames never match, even with the right name
        let frame = Frame {
            function: "main".to_string(),
            status: "missing".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.is_cocoa_main(), (false, 0));
    }

    #[test]
    fn test_rust_main_detection() {
        let frame = Frame {
            function: "server::main".to_string(),
            status: "symbolicated".to_string(),
            ..Default::default()
        };
        assert!(frame.is_rust_main());

        let frame = Frame {
            function: "server::main_loop".to_string(),
            status: "symbolicated".to_string(),
            ..Default::default()
        };
        assert!(!frame.is_rust_main());
    }

    #[test]
    fn test_rust_inline_detection() {
        let frame = Frame {
            status: "symbolicated".to_string(),
            ..Default::default()
        };
        assert!(frame.is_rust_inline());

        let frame = Frame {
            status: "symbolicated".to_string(),
            sym_addr: "0x1000".to_string(),
            ..Default::default()
        };
        assert!(!frame.is_rust_inline());
    }
}
