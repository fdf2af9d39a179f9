//! Speedscope visualization payload.
//!
//! Defines the output document shape (field names are part of the wire
//! contract consumed by the frontend renderer) and dispatches a decoded
//! profile to the evented or sampled emitter.

mod evented;
mod sampled;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::parser::android::Clock;
use crate::parser::{Profile, ProfileData};
use crate::utils::error::ProfileError;

/// Top-level speedscope document.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Output {
    #[serde(rename = "activeProfileIndex")]
    pub active_profile_index: usize,

    #[serde(rename = "androidClock", skip_serializing_if = "Option::is_none")]
    pub android_clock: Option<Clock>,

    #[serde(rename = "durationNS")]
    pub duration_ns: u64,

    pub platform: String,

    #[serde(rename = "profileID")]
    pub profile_id: String,

    pub profiles: Vec<ProfileView>,

    #[serde(rename = "projectID")]
    pub project_id: u64,

    pub shared: SharedData,

    #[serde(rename = "transactionName")]
    pub transaction_name: String,

    pub version: String,
}

/// Frame table shared by every thread profile.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct SharedData {
    pub frames: Vec<SharedFrame>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// An entry of the shared frame table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedFrame {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(skip_serializing_if = "is_false")]
    pub inline: bool,

    pub is_application: bool,

    #[serde(skip_serializing_if = "is_zero")]
    pub line: u32,

    pub name: String,
}

/// One thread's profile, evented (Android) or sampled (everything else).
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProfileView {
    Evented(EventedProfile),
    Sampled(SampledProfile),
}

impl ProfileView {
    /// Thread the profile belongs to, independent of its shape.
    pub fn thread_id(&self) -> u64 {
        match self {
            ProfileView::Evented(profile) => profile.thread_id,
            ProfileView::Sampled(profile) => profile.thread_id,
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct EventedProfile {
    pub unit: &'static str,

    pub name: String,

    #[serde(rename = "threadID")]
    pub thread_id: u64,

    #[serde(rename = "startValue")]
    pub start_value: u64,

    #[serde(rename = "endValue")]
    pub end_value: u64,

    pub events: Vec<FrameEvent>,
}

/// A frame being opened or closed at a point in time.
#[derive(Debug, PartialEq, Serialize)]
pub struct FrameEvent {
    #[serde(rename = "type")]
    pub event_type: FrameEventType,

    pub frame: usize,

    pub at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameEventType {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "C")]
    Close,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct SampledProfile {
    pub unit: &'static str,

    pub name: String,

    #[serde(rename = "threadID")]
    pub thread_id: u64,

    #[serde(rename = "isMainThread")]
    pub is_main_thread: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(rename = "startValue")]
    pub start_value: u64,

    #[serde(rename = "endValue")]
    pub end_value: u64,

    /// Stacks of frame-table indices, root-first
    pub samples: Vec<Vec<usize>>,

    pub weights: Vec<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub queues: Option<BTreeMap<String, Queue>>,
}

/// Activity interval of one dispatch queue (cocoa only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Queue {
    pub label: String,

    #[serde(rename = "startNS")]
    pub start_ns: u64,

    #[serde(rename = "endNS")]
    pub end_ns: u64,
}

/// Render the visualization payload for a decoded profile.
pub fn render(profile: &Profile) -> Result<Output, ProfileError> {
    let mut output = match &profile.data {
        ProfileData::Android(android) => evented::render(android)?,
        ProfileData::Cocoa(cocoa) => sampled::render_cocoa(cocoa),
        ProfileData::Python(python) => sampled::render_python(python),
        ProfileData::Rust(rust) => sampled::render_rust(rust),
    };
    output.duration_ns = profile.duration_ns;
    output.platform = profile.platform.clone();
    output.profile_id = profile.profile_id.clone();
    output.project_id = profile.project_id;
    output.transaction_name = profile.transaction_name.clone();
    output.version = profile.version.clone();
    Ok(output)
}
