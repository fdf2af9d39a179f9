//! Evented emitter for Android method traces.
//!
//! Replays enter/exit events into open/close frame events against the
//! shared frame table, one evented profile per thread.

use std::collections::HashMap;

use log::warn;

use crate::parser::android::{unknown_method_frame, AndroidProfile, MethodFrame};
use crate::utils::config::VALUE_UNIT_NANOSECONDS;
use crate::utils::error::ProfileError;

use super::{
    EventedProfile, FrameEvent, FrameEventType, Output, ProfileView, SharedData, SharedFrame,
};

/// Shared frame table keyed by method id. Methods referenced by events
/// but missing from the method table get a synthesized frame on first
/// use instead of failing the profile.
#[derive(Default)]
struct FrameTable {
    frames: Vec<SharedFrame>,
    by_method: HashMap<u64, Vec<usize>>,
}

impl FrameTable {
    fn insert(&mut self, method_id: u64, method_frames: &[MethodFrame]) {
        let indexes = self.by_method.entry(method_id).or_default();
        for method_frame in method_frames {
            indexes.push(self.frames.len());
            self.frames.push(SharedFrame {
                file: method_frame.frame.filename.clone(),
                image: method_frame.frame.package.clone(),
                inline: method_frame.frame.inline,
                is_application: method_frame.is_application,
                line: method_frame.frame.lineno,
                name: method_frame.frame.function.clone(),
            });
        }
    }

    fn indexes(&mut self, method_id: u64) -> Vec<usize> {
        if !self.by_method.contains_key(&method_id) {
            warn!("method {method_id} missing from the method table, synthesizing a frame");
            let unknown = unknown_method_frame(method_id);
            self.insert(method_id, &[unknown]);
        }
        self.by_method[&method_id].clone()
    }
}

#[derive(Default)]
struct ThreadEvents {
    profile: EventedProfile,
    stack: Vec<u64>,
}

impl ThreadEvents {
    fn emit(&mut self, event_type: FrameEventType, frame_indexes: &[usize], at: u64) {
        for &frame in frame_indexes {
            self.profile.events.push(FrameEvent {
                event_type,
                frame,
                at,
            });
        }
    }
}

pub(super) fn render(profile: &AndroidProfile) -> Result<Output, ProfileError> {
    let mut table = FrameTable::default();
    for method in &profile.methods {
        table.insert(method.id, &method.frames()?);
    }

    let mut threads: HashMap<u64, ThreadEvents> = HashMap::new();

    for event in &profile.events {
        let ts = profile.timestamp(&event.time);
        let thread = threads.entry(event.thread_id).or_insert_with(|| ThreadEvents {
            profile: EventedProfile {
                unit: VALUE_UNIT_NANOSECONDS,
                thread_id: event.thread_id,
                start_value: ts,
                ..Default::default()
            },
            stack: Vec::new(),
        });
        thread.profile.end_value = ts;

        match event.action.as_str() {
            "Enter" => {
                thread.stack.push(event.method_id);
                let indexes = table.indexes(event.method_id);
                thread.emit(FrameEventType::Open, &indexes, ts);
            }
            "Exit" | "Unwind" => {
                if thread.stack.is_empty() {
                    return Err(ProfileError::DataIntegrity(format!(
                        "exiting method {} on thread {} but the stack is empty",
                        event.method_id, event.thread_id
                    )));
                }
                // The method should be on top of the stack, but children
                // that were never explicitly exited may sit above it; they
                // get synthesized close events, top of stack first.
                let position = thread
                    .stack
                    .iter()
                    .rposition(|&method_id| method_id == event.method_id)
                    .ok_or_else(|| {
                        ProfileError::DataIntegrity(format!(
                            "exiting method {} on thread {} but the stack does not contain it",
                            event.method_id, event.thread_id
                        ))
                    })?;
                for index in (position..thread.stack.len()).rev() {
                    let method_id = thread.stack[index];
                    let indexes = table.indexes(method_id);
                    thread.emit(FrameEventType::Close, &indexes, ts);
                }
                thread.stack.truncate(position);
            }
            other => {
                return Err(ProfileError::DataIntegrity(format!(
                    "invalid method action: {other}"
                )))
            }
        }
    }

    // Close whatever is still open at each thread's last timestamp.
    for thread in threads.values_mut() {
        let end = thread.profile.end_value;
        for index in (0..thread.stack.len()).rev() {
            let method_id = thread.stack[index];
            let indexes = table.indexes(method_id);
            thread.emit(FrameEventType::Close, &indexes, end);
        }
        thread.stack.clear();
    }

    // Emit profiles in ascending thread id order, using the thread names
    // from the trace metadata; threads without metadata are not rendered.
    let mut metadata = profile.threads.clone();
    metadata.sort_by_key(|thread| thread.id);

    let mut active_profile_index = 0;
    let mut profiles = Vec::new();
    for thread in metadata {
        let Some(mut events) = threads.remove(&thread.id) else {
            continue;
        };
        if thread.name == "main" {
            active_profile_index = profiles.len();
        }
        events.profile.name = thread.name;
        profiles.push(ProfileView::Evented(events.profile));
    }

    Ok(Output {
        active_profile_index,
        android_clock: Some(profile.clock),
        profiles,
        shared: SharedData {
            frames: table.frames,
        },
        ..Default::default()
    })
}
