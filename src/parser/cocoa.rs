//! iOS sampled-profile decoder.
//!
//! Cocoa payloads carry stack samples plus thread and dispatch-queue
//! metadata. Frames are deduplicated by instruction address.

use std::collections::HashMap;

use serde::Deserialize;

use crate::parser::schema::{QueueMetadata, Sample, ThreadMetadata};

/// A decoded cocoa sampled payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CocoaProfile {
    #[serde(default)]
    pub queue_metadata: HashMap<String, QueueMetadata>,

    #[serde(default)]
    pub samples: Vec<Sample>,

    /// Keyed by the decimal thread id
    #[serde(default)]
    pub thread_metadata: HashMap<String, ThreadMetadata>,
}

impl CocoaProfile {
    /// Identify the main thread: the thread running the queue labeled as
    /// the main-thread queue, or the lowest thread id observed when no
    /// queue is labeled.
    pub fn main_thread_id(&self) -> u64 {
        for sample in &self.samples {
            if let Some(queue) = self.queue_metadata.get(&sample.queue_address) {
                if queue.labeled_as_main_thread() {
                    return sample.thread_id;
                }
            }
        }
        self.samples
            .iter()
            .map(|sample| sample.thread_id)
            .min()
            .unwrap_or_default()
    }
}
