//! Rust sampled-profile decoder.
//!
//! Same sample shape as cocoa, without queue metadata. The profiler
//! timestamps samples with the system clock, which is not monotonic, so
//! samples are stably sorted by timestamp at decode time.

use serde::Deserialize;

use crate::parser::schema::Sample;

/// A decoded rust sampled payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RustProfile {
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl RustProfile {
    /// Restore timestamp order. The sort is stable so samples with equal
    /// timestamps keep their capture order.
    pub fn normalize(&mut self) {
        self.samples
            .sort_by_key(|sample| sample.relative_timestamp_ns);
    }

    /// The rust profiler reports no queue or thread metadata; the main
    /// thread is the lowest thread id observed.
    pub fn main_thread_id(&self) -> u64 {
        self.samples
            .iter()
            .map(|sample| sample.thread_id)
            .min()
            .unwrap_or_default()
    }
}
