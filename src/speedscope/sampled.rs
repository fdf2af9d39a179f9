//! Sampled emitters for cocoa, rust and python profiles.
//!
//! Each thread becomes one sampled profile: stacks of frame-table
//! indices plus inter-sample weights. The elapsed time between two
//! samples weighs the earlier one; a terminal zero weight keeps the
//! weights and samples arrays the same length.

use std::collections::{BTreeMap, HashMap};

use crate::classify::{image_base_name, is_cocoa_application_image, is_rust_application_image};
use crate::parser::cocoa::CocoaProfile;
use crate::parser::python::PythonProfile;
use crate::parser::rust::RustProfile;
use crate::utils::config::VALUE_UNIT_NANOSECONDS;

use super::{Output, ProfileView, Queue, SampledProfile, SharedData, SharedFrame};

/// Emit profiles in ascending thread id order; the main thread (when one
/// is marked) picks the active profile index and has its pre-entry-point
/// frames trimmed.
fn finalize(
    mut by_thread: HashMap<u64, SampledProfile>,
    main_frame_index: Option<i64>,
) -> (usize, Vec<ProfileView>) {
    let mut thread_ids: Vec<u64> = by_thread.keys().copied().collect();
    thread_ids.sort_unstable();

    let mut active_profile_index = 0;
    let mut profiles = Vec::with_capacity(thread_ids.len());
    for thread_id in thread_ids {
        let Some(mut profile) = by_thread.remove(&thread_id) else {
            continue;
        };
        if profile.is_main_thread {
            active_profile_index = profiles.len();
            if let Some(main_index) = main_frame_index {
                for stack in profile.samples.iter_mut() {
                    if let Some(position) = stack.iter().position(|&frame| frame as i64 == main_index)
                    {
                        stack.drain(..position);
                    }
                }
            }
        }
        profile.weights.push(0);
        profiles.push(ProfileView::Sampled(profile));
    }
    (active_profile_index, profiles)
}

pub(super) fn render_cocoa(profile: &CocoaProfile) -> Output {
    let main_thread_id = profile.main_thread_id();

    let mut by_thread: HashMap<u64, SampledProfile> = HashMap::new();
    let mut previous_ts: HashMap<u64, u64> = HashMap::new();
    let mut frames: Vec<SharedFrame> = Vec::new();
    let mut index_by_address: HashMap<String, usize> = HashMap::new();
    // frame index of the entry point, used to trim everything before it
    let mut main_frame_index: Option<i64> = None;

    for sample in &profile.samples {
        let ts = sample.relative_timestamp_ns;
        let queue = profile.queue_metadata.get(&sample.queue_address);

        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            if let Some(queue) = queue {
                if let Some(queues) = thread_profile.queues.as_mut() {
                    queues
                        .entry(queue.label.clone())
                        .and_modify(|entry| entry.end_ns = ts)
                        .or_insert_with(|| Queue {
                            label: queue.label.clone(),
                            start_ns: ts,
                            end_ns: ts,
                        });
                }
            }
            let previous = previous_ts.get(&sample.thread_id).copied().unwrap_or(ts);
            thread_profile.weights.push(ts - previous);
        } else {
            let metadata = profile.thread_metadata.get(&sample.thread_id.to_string());
            let metadata_name = metadata.map(|m| m.name.as_str()).unwrap_or("");
            let name = match queue {
                Some(queue)
                    if metadata_name.is_empty()
                        && (!queue.labeled_as_main_thread()
                            || sample.thread_id != main_thread_id) =>
                {
                    queue.label.clone()
                }
                _ => sample.thread_id.to_string(),
            };
            let mut queues = BTreeMap::new();
            if let Some(queue) = queue {
                queues.insert(
                    queue.label.clone(),
                    Queue {
                        label: queue.label.clone(),
                        start_ns: ts,
                        end_ns: ts,
                    },
                );
            }
            by_thread.insert(
                sample.thread_id,
                SampledProfile {
                    unit: VALUE_UNIT_NANOSECONDS,
                    name,
                    thread_id: sample.thread_id,
                    is_main_thread: sample.thread_id == main_thread_id,
                    priority: metadata.and_then(|m| m.priority.filter(|&p| p != 0)),
                    start_value: ts,
                    queues: Some(queues),
                    ..Default::default()
                },
            );
        }

        let mut stack = Vec::with_capacity(sample.frames.len());
        for frame in sample.frames.iter().rev() {
            let index = match index_by_address.get(&frame.instruction_addr) {
                Some(&index) => index,
                None => {
                    let index = frames.len();
                    let mut name = frame.function.clone();
                    if name.is_empty() {
                        name = format!("unknown ({})", frame.instruction_addr);
                    } else if main_frame_index.is_none() {
                        let (is_main, offset) = frame.is_cocoa_main();
                        if is_main {
                            main_frame_index = Some(index as i64 + offset);
                        }
                    }
                    index_by_address.insert(frame.instruction_addr.clone(), index);
                    frames.push(SharedFrame {
                        file: frame.filename.clone(),
                        image: image_base_name(&frame.package).to_string(),
                        inline: false,
                        is_application: is_cocoa_application_image(&frame.package),
                        line: frame.lineno,
                        name,
                    });
                    index
                }
            };
            stack.push(index);
        }

        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            thread_profile.samples.push(stack);
            thread_profile.end_value = ts;
        }
        previous_ts.insert(sample.thread_id, ts);
    }

    let (active_profile_index, profiles) = finalize(by_thread, main_frame_index);
    Output {
        active_profile_index,
        profiles,
        shared: SharedData { frames },
        ..Default::default()
    }
}

pub(super) fn render_rust(profile: &RustProfile) -> Output {
    let main_thread_id = profile.main_thread_id();

    let mut by_thread: HashMap<u64, SampledProfile> = HashMap::new();
    let mut previous_ts: HashMap<u64, u64> = HashMap::new();
    let mut frames: Vec<SharedFrame> = Vec::new();
    let mut index_by_address: HashMap<String, usize> = HashMap::new();
    let mut main_frame_index: Option<i64> = None;

    for sample in &profile.samples {
        let ts = sample.relative_timestamp_ns;

        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            let previous = previous_ts.get(&sample.thread_id).copied().unwrap_or(ts);
            thread_profile.weights.push(ts - previous);
        } else {
            // the profiler falls back to the thread id as the thread name,
            // so a name matching the main thread id means the main thread
            let mut name = sample.thread_name.clone();
            if name == main_thread_id.to_string() {
                name = "main".to_string();
            }
            by_thread.insert(
                sample.thread_id,
                SampledProfile {
                    unit: VALUE_UNIT_NANOSECONDS,
                    name,
                    thread_id: sample.thread_id,
                    is_main_thread: sample.thread_id == main_thread_id,
                    start_value: ts,
                    ..Default::default()
                },
            );
        }

        let mut stack = Vec::with_capacity(sample.frames.len());
        for frame in sample.frames.iter().rev() {
            let address = frame.address();
            let index = match index_by_address.get(address) {
                Some(&index) => index,
                None => {
                    let index = frames.len();
                    let mut name = frame.function.clone();
                    if name.is_empty() {
                        name = format!("unknown ({})", frame.instruction_addr);
                    } else if main_frame_index.is_none() && frame.is_rust_main() {
                        main_frame_index = Some(index as i64);
                    }
                    index_by_address.insert(address.to_string(), index);
                    frames.push(SharedFrame {
                        file: frame.filename.clone(),
                        image: image_base_name(&frame.package).to_string(),
                        inline: frame.is_rust_inline(),
                        is_application: is_rust_application_image(&frame.package),
                        line: frame.lineno,
                        name,
                    });
                    index
                }
            };
            stack.push(index);
        }

        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            thread_profile.samples.push(stack);
            thread_profile.end_value = ts;
        }
        previous_ts.insert(sample.thread_id, ts);
    }

    let (active_profile_index, profiles) = finalize(by_thread, main_frame_index);
    Output {
        active_profile_index,
        profiles,
        shared: SharedData { frames },
        ..Default::default()
    }
}

pub(super) fn render_python(profile: &PythonProfile) -> Output {
    let mut by_thread: HashMap<u64, SampledProfile> = HashMap::new();
    let mut previous_ts: HashMap<u64, u64> = HashMap::new();

    for sample in &profile.samples {
        let ts = sample.relative_timestamp_ns;

        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            let previous = previous_ts.get(&sample.thread_id).copied().unwrap_or(ts);
            thread_profile.weights.push(ts - previous);
        } else {
            by_thread.insert(
                sample.thread_id,
                SampledProfile {
                    unit: VALUE_UNIT_NANOSECONDS,
                    name: sample.thread_id.to_string(),
                    thread_id: sample.thread_id,
                    is_main_thread: false,
                    start_value: ts,
                    ..Default::default()
                },
            );
        }

        let stack: Vec<usize> = sample.frames.iter().rev().copied().collect();
        if let Some(thread_profile) = by_thread.get_mut(&sample.thread_id) {
            thread_profile.samples.push(stack);
            thread_profile.end_value = ts;
        }
        previous_ts.insert(sample.thread_id, ts);
    }

    let frames = profile
        .frames
        .iter()
        .map(|frame| SharedFrame {
            file: frame.file.clone(),
            line: frame.line,
            name: frame.name.clone(),
            ..Default::default()
        })
        .collect();

    // no thread is marked as main here, so the first profile stays active
    let (active_profile_index, profiles) = finalize(by_thread, None);
    Output {
        active_profile_index,
        profiles,
        shared: SharedData { frames },
        ..Default::default()
    }
}
