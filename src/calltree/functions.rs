//! Per-function self-time aggregation.
//!
//! Walks a call tree and accumulates, for every function, the list of
//! self times of its occurrences. The list keeps one entry per occurrence
//! rather than a sum so downstream percentile computations stay possible.

use std::collections::HashMap;

use serde::Serialize;

use super::node::{frame_identity_hash, Node};

/// Aggregated occurrences of one function across a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallTreeFunction {
    pub fingerprint: u64,
    pub function: String,
    pub package: String,
    pub path: String,
    pub in_app: bool,
    pub self_times_ns: Vec<u64>,
}

/// Collect functions with a non-zero self time into `results`, keyed by
/// frame identity so occurrences on different call paths merge.
///
/// Self time is adapted to how the trees are consumed downstream: a
/// system node's self time is its duration minus its children's
/// durations, while an application node's self time only stops at the
/// next application frame below it, so system frames it calls accrue to
/// it as well as to themselves.
///
/// Returns the application duration of the subtree: the node's own
/// duration for an application node, the children's combined application
/// duration otherwise.
pub fn collect_functions(node: &Node, results: &mut HashMap<u64, CallTreeFunction>) -> u64 {
    let mut children_application_ns: u64 = 0;
    let mut children_ns: u64 = 0;
    for child in &node.children {
        children_application_ns += collect_functions(child, results);
        children_ns += child.duration_ns;
    }

    let self_time_ns = if node.is_application {
        node.duration_ns.saturating_sub(children_application_ns)
    } else {
        node.duration_ns.saturating_sub(children_ns)
    };

    if self_time_ns > 0 && !node.name.is_empty() {
        let fingerprint = frame_identity_hash(&node.name, &node.package);
        results
            .entry(fingerprint)
            .or_insert_with(|| CallTreeFunction {
                fingerprint,
                function: node.name.clone(),
                package: node.package.clone(),
                path: node.path.clone(),
                in_app: node.is_application,
                self_times_ns: Vec::new(),
            })
            .self_times_ns
            .push(self_time_ns);
    }

    if node.is_application {
        node.duration_ns
    } else {
        children_application_ns
    }
}
