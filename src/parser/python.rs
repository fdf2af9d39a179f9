//! Python sampled-profile decoder.
//!
//! Python payloads ship their own frame table; samples reference frames
//! by index, so no identity work is needed here. Samples are stably
//! sorted by timestamp at decode time.

use serde::Deserialize;

/// An entry of the python frame table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PythonFrame {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line: u32,
}

/// A stack snapshot referencing the frame table, leaf-first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PythonSample {
    #[serde(default)]
    pub frames: Vec<usize>,
    pub relative_timestamp_ns: u64,
    pub thread_id: u64,
}

/// A decoded python sampled payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PythonProfile {
    #[serde(default)]
    pub frames: Vec<PythonFrame>,
    #[serde(default)]
    pub samples: Vec<PythonSample>,
}

impl PythonProfile {
    /// Restore timestamp order. The sort is stable so samples with equal
    /// timestamps keep their capture order.
    pub fn normalize(&mut self) {
        self.samples
            .sort_by_key(|sample| sample.relative_timestamp_ns);
    }
}
