//! Call-tree construction.
//!
//! Folds a platform's decoded stream into one forest of rooted trees per
//! thread. Sampled platforms feed ordered stack snapshots; Android feeds
//! enter/exit events. Both paths share [`ThreadBuilder`], which tracks the
//! currently open root-to-leaf chain for one thread.

use std::collections::HashMap;

use log::warn;

use crate::classify::{is_cocoa_application_image, is_rust_application_image};
use crate::parser::android::{unknown_method_frame, AndroidProfile, MethodFrame};
use crate::parser::python::PythonProfile;
use crate::parser::schema::{Frame, Sample};
use crate::parser::ProfileData;
use crate::utils::error::ProfileError;

use super::node::{frame_identity_hash, Node};

/// Build the raw (uncollapsed) call-tree forests for a decoded payload.
pub fn call_trees(
    data: &ProfileData,
    profile_id: &str,
) -> Result<HashMap<u64, Vec<Node>>, ProfileError> {
    match data {
        ProfileData::Android(profile) => android_call_trees(profile, profile_id),
        ProfileData::Cocoa(profile) => Ok(sampled_call_trees(
            &profile.samples,
            |frame| is_cocoa_application_image(&frame.package),
            profile_id,
        )),
        ProfileData::Rust(profile) => Ok(sampled_call_trees(
            &profile.samples,
            |frame| is_rust_application_image(&frame.package),
            profile_id,
        )),
        ProfileData::Python(profile) => python_call_trees(profile, profile_id),
    }
}

/// Incrementally grows one thread's forest. The open root-to-leaf chain
/// is always the chain of last children starting at the last root, so the
/// builder only tracks its frame identities.
#[derive(Debug, Default)]
struct ThreadBuilder {
    roots: Vec<Node>,
    open: Vec<u64>,
    last_seen_ns: u64,
}

impl ThreadBuilder {
    /// The open node at `depth`, or None if the chain is shallower.
    fn node_at(&mut self, depth: usize) -> Option<&mut Node> {
        let mut node = self.roots.last_mut()?;
        for _ in 0..depth {
            node = node.children.last_mut()?;
        }
        Some(node)
    }

    /// Open a node for `frame` below the current deepest open node.
    fn open_frame(
        &mut self,
        frame: Frame,
        is_application: bool,
        ts: u64,
        sample_count: u64,
        profile_id: &str,
    ) {
        let identity = frame_identity_hash(&frame.function, &frame.package);
        match self.open.len() {
            0 => {
                let node = Node::from_frame(frame, is_application, ts, sample_count, 0, profile_id);
                self.roots.push(node);
            }
            depth => {
                if let Some(parent) = self.node_at(depth - 1) {
                    let parent_fingerprint = parent.fingerprint;
                    let node = Node::from_frame(
                        frame,
                        is_application,
                        ts,
                        sample_count,
                        parent_fingerprint,
                        profile_id,
                    );
                    parent.children.push(node);
                }
            }
        }
        self.open.push(identity);
        self.last_seen_ns = ts;
    }

    /// Close the deepest open node at `ts`.
    fn close_top(&mut self, ts: u64) {
        if self.open.is_empty() {
            return;
        }
        let depth = self.open.len() - 1;
        if let Some(node) = self.node_at(depth) {
            node.close(ts);
        }
        self.open.pop();
        self.last_seen_ns = ts;
    }

    /// Fold in the next stack snapshot, root-first. Frames diverging from
    /// the open chain are closed at `ts`, new frames are opened at `ts`,
    /// and every node on the new chain counts the sample.
    fn advance<F>(&mut self, ts: u64, stack: &[Frame], is_application: &F, profile_id: &str)
    where
        F: Fn(&Frame) -> bool,
    {
        let mut common = 0;
        while common < self.open.len() && common < stack.len() {
            let identity =
                frame_identity_hash(&stack[common].function, &stack[common].package);
            if identity != self.open[common] {
                break;
            }
            common += 1;
        }

        while self.open.len() > common {
            self.close_top(ts);
        }
        for frame in &stack[common..] {
            self.open_frame(frame.clone(), is_application(frame), ts, 0, profile_id);
        }

        self.count_sample(stack.len());
        self.last_seen_ns = ts;
    }

    /// Increment the sample count on every node of the open chain.
    fn count_sample(&mut self, chain_len: usize) {
        if chain_len == 0 {
            return;
        }
        let mut node = match self.roots.last_mut() {
            Some(node) => node,
            None => return,
        };
        node.sample_count += 1;
        for _ in 1..chain_len {
            node = match node.children.last_mut() {
                Some(node) => node,
                None => return,
            };
            node.sample_count += 1;
        }
    }

    /// Close whatever is still open at the last observed timestamp and
    /// hand the forest over.
    fn finish(mut self) -> Vec<Node> {
        let last_seen = self.last_seen_ns;
        while !self.open.is_empty() {
            self.close_top(last_seen);
        }
        self.roots
    }
}

/// Fold ordered stack samples into per-thread forests. Sample frames are
/// stored leaf-first and reversed here.
fn sampled_call_trees<F>(
    samples: &[Sample],
    is_application: F,
    profile_id: &str,
) -> HashMap<u64, Vec<Node>>
where
    F: Fn(&Frame) -> bool,
{
    let mut builders: HashMap<u64, ThreadBuilder> = HashMap::new();

    for sample in samples {
        let stack: Vec<Frame> = sample.frames.iter().rev().cloned().collect();
        builders
            .entry(sample.thread_id)
            .or_default()
            .advance(
                sample.relative_timestamp_ns,
                &stack,
                &is_application,
                profile_id,
            );
    }

    builders
        .into_iter()
        .map(|(thread_id, builder)| (thread_id, builder.finish()))
        .collect()
}

/// Python samples reference an external frame table; resolve the indices
/// before folding. A sample pointing outside the table is corrupt input.
fn python_call_trees(
    profile: &PythonProfile,
    profile_id: &str,
) -> Result<HashMap<u64, Vec<Node>>, ProfileError> {
    let mut builders: HashMap<u64, ThreadBuilder> = HashMap::new();

    for sample in &profile.samples {
        let mut stack = Vec::with_capacity(sample.frames.len());
        for &index in sample.frames.iter().rev() {
            let frame = profile.frames.get(index).ok_or_else(|| {
                ProfileError::DataIntegrity(format!(
                    "sample on thread {} references frame {} but the table holds {}",
                    sample.thread_id,
                    index,
                    profile.frames.len()
                ))
            })?;
            stack.push(Frame {
                function: frame.name.clone(),
                filename: frame.file.clone(),
                lineno: frame.line,
                ..Default::default()
            });
        }
        builders.entry(sample.thread_id).or_default().advance(
            sample.relative_timestamp_ns,
            &stack,
            &|_| false,
            profile_id,
        );
    }

    Ok(builders
        .into_iter()
        .map(|(thread_id, builder)| (thread_id, builder.finish()))
        .collect())
}

#[derive(Debug, Default)]
struct EventedThread {
    builder: ThreadBuilder,
    /// Open methods with the number of frames each contributed
    stack: Vec<(u64, usize)>,
}

/// Fold Android enter/exit events into per-thread forests.
///
/// An `Exit` or `Unwind` may close child methods that were never
/// explicitly exited; their nodes are closed at the exit timestamp, in
/// stack order. An exit for a method that is not on the stack at all is a
/// data integrity error.
fn android_call_trees(
    profile: &AndroidProfile,
    profile_id: &str,
) -> Result<HashMap<u64, Vec<Node>>, ProfileError> {
    let mut method_frames: HashMap<u64, Vec<MethodFrame>> = HashMap::new();
    for method in &profile.methods {
        method_frames.insert(method.id, method.frames()?);
    }

    let mut threads: HashMap<u64, EventedThread> = HashMap::new();

    for event in &profile.events {
        let ts = profile.timestamp(&event.time);
        let thread = threads.entry(event.thread_id).or_default();

        match event.action.as_str() {
            "Enter" => {
                let frames = method_frames.entry(event.method_id).or_insert_with(|| {
                    warn!(
                        "method {} missing from the method table, synthesizing a frame",
                        event.method_id
                    );
                    vec![unknown_method_frame(event.method_id)]
                });
                for method_frame in frames.iter() {
                    thread.builder.open_frame(
                        method_frame.frame.clone(),
                        method_frame.is_application,
                        ts,
                        1,
                        profile_id,
                    );
                }
                thread.stack.push((event.method_id, frames.len()));
            }
            "Exit" | "Unwind" => {
                if thread.stack.is_empty() {
                    return Err(ProfileError::DataIntegrity(format!(
                        "exiting method {} on thread {} but the stack is empty",
                        event.method_id, event.thread_id
                    )));
                }
                let position = thread
                    .stack
                    .iter()
                    .rposition(|&(method_id, _)| method_id == event.method_id)
                    .ok_or_else(|| {
                        ProfileError::DataIntegrity(format!(
                            "exiting method {} on thread {} but the stack does not contain it",
                            event.method_id, event.thread_id
                        ))
                    })?;
                while thread.stack.len() > position {
                    if let Some((_, frame_count)) = thread.stack.pop() {
                        for _ in 0..frame_count {
                            thread.builder.close_top(ts);
                        }
                    }
                }
            }
            other => {
                return Err(ProfileError::DataIntegrity(format!(
                    "invalid method action: {other}"
                )))
            }
        }
    }

    Ok(threads
        .into_iter()
        .map(|(thread_id, thread)| (thread_id, thread.builder.finish()))
        .collect())
}
