//! Call-tree nodes.
//!
//! A node is one dynamic frame instance: a frame observed at a given
//! position in a thread's stack, with aggregated duration, sample count
//! and a fingerprint stable across profiles with the same call paths.

use std::collections::HashSet;

use serde::Serialize;

use crate::parser::schema::Frame;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_fold(mut state: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        state ^= u64::from(byte);
        state = state.wrapping_mul(FNV_PRIME);
    }
    state
}

/// 64-bit identity of a frame, independent of its position in the tree.
/// Two frames with the same function and package share an identity even
/// when reached through different call paths.
pub fn frame_identity_hash(function: &str, package: &str) -> u64 {
    let state = fnv1a_fold(FNV_OFFSET_BASIS, function.as_bytes());
    let state = fnv1a_fold(state, &[0xff]);
    fnv1a_fold(state, package.as_bytes())
}

/// Derive a node fingerprint from its parent's fingerprint and the
/// frame identity. Roots use a parent fingerprint of 0.
pub fn mix_fingerprint(parent: u64, frame_hash: u64) -> u64 {
    fnv1a_fold(parent ^ FNV_OFFSET_BASIS, &frame_hash.to_le_bytes())
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// One node of a thread's call tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,

    pub package: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub line: u32,

    pub fingerprint: u64,

    pub is_application: bool,

    pub start_ns: u64,

    pub end_ns: u64,

    pub duration_ns: u64,

    pub sample_count: u64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,

    #[serde(skip_serializing_if = "HashSet::is_empty")]
    pub profile_ids: HashSet<String>,

    /// Originating frame, kept for downstream consumers
    #[serde(skip)]
    pub frame: Frame,
}

impl Node {
    /// Open a new node for a frame first observed at `start_ns`.
    pub fn from_frame(
        frame: Frame,
        is_application: bool,
        start_ns: u64,
        sample_count: u64,
        parent_fingerprint: u64,
        profile_id: &str,
    ) -> Self {
        let fingerprint = mix_fingerprint(
            parent_fingerprint,
            frame_identity_hash(&frame.function, &frame.package),
        );
        let mut profile_ids = HashSet::new();
        if !profile_id.is_empty() {
            profile_ids.insert(profile_id.to_string());
        }
        Node {
            name: frame.function.clone(),
            package: frame.package.clone(),
            path: frame.path.clone(),
            line: frame.lineno,
            fingerprint,
            is_application,
            start_ns,
            end_ns: start_ns,
            duration_ns: 0,
            sample_count,
            children: Vec::new(),
            profile_ids,
            frame,
        }
    }

    /// Close the node at `end_ns` and fix its duration.
    pub fn close(&mut self, end_ns: u64) {
        self.end_ns = end_ns;
        self.duration_ns = end_ns.saturating_sub(self.start_ns);
    }

    /// A node that carries no name, package or path cannot be attributed
    /// to anything and only adds noise.
    fn is_nameless(&self) -> bool {
        self.name.is_empty() && self.package.is_empty() && self.path.is_empty()
    }

    /// Simplify the tree by removing uninformative single-child chains.
    ///
    /// Children are collapsed first, then this node is examined. A
    /// nameless node is always replaced by its children. When the node has
    /// exactly one child spanning its whole interval, the more informative
    /// of the two survives: the child when both have the same
    /// classification or the child is application code, the node (adopting
    /// the grandchildren) when application code wraps a system child.
    ///
    /// Returns the surviving forest, which is empty when the whole subtree
    /// was nameless. The operation is idempotent.
    pub fn collapse(mut self) -> Vec<Node> {
        let mut children = Vec::with_capacity(self.children.len());
        for child in std::mem::take(&mut self.children) {
            children.extend(child.collapse());
        }
        self.children = children;

        if self.is_nameless() {
            return self.children;
        }

        if self.children.len() == 1 && self.children[0].duration_ns == self.duration_ns {
            if self.children[0].is_application || !self.is_application {
                return self.children;
            }
            // application frame wrapping a system child: absorb the child
            let child = self.children.remove(0);
            self.children = child.children;
        }

        vec![self]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a test node; `duration_ns` is derived from the interval.
    fn node(
        name: &str,
        is_application: bool,
        start_ns: u64,
        end_ns: u64,
        sample_count: u64,
        children: Vec<Node>,
    ) -> Node {
        let (package, path) = if name.is_empty() {
            (String::new(), String::new())
        } else {
            ("package".to_string(), "path".to_string())
        };
        Node {
            name: name.to_string(),
            package,
            path,
            line: 0,
            fingerprint: 0,
            is_application,
            start_ns,
            end_ns,
            duration_ns: end_ns - start_ns,
            sample_count,
            children,
            profile_ids: HashSet::new(),
            frame: Frame::default(),
        }
    }

    #[test]
    fn test_fingerprint_depends_only_on_the_path() {
        let root = frame_identity_hash("main", "app");
        let child = frame_identity_hash("foo", "app");

        let a = mix_fingerprint(mix_fingerprint(0, root), child);
        let b = mix_fingerprint(mix_fingerprint(0, root), child);
        assert_eq!(a, b);

        // a different parent changes the fingerprint
        let other_root = frame_identity_hash("worker", "app");
        let c = mix_fingerprint(mix_fingerprint(0, other_root), child);
        assert_ne!(a, c);
    }

    #[test]
    fn test_frame_identity_separates_function_and_package() {
        assert_ne!(
            frame_identity_hash("ab", "c"),
            frame_identity_hash("a", "bc")
        );
    }

    #[test]
    fn test_collapse_single_node() {
        let root = node("root", true, 0, 10, 10, vec![]);
        let expected = vec![node("root", true, 0, 10, 10, vec![])];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_keeps_multiple_children() {
        let root = node(
            "root",
            true,
            0,
            10,
            10,
            vec![
                node("child1", true, 0, 5, 5, vec![]),
                node("child2", true, 5, 10, 5, vec![]),
            ],
        );
        let expected = vec![node(
            "root",
            true,
            0,
            10,
            10,
            vec![
                node("child1", true, 0, 5, 5, vec![]),
                node("child2", true, 5, 10, 5, vec![]),
            ],
        )];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_keeps_single_child_with_shorter_duration() {
        let root = node(
            "root",
            true,
            0,
            10,
            10,
            vec![node("child", true, 0, 5, 5, vec![])],
        );
        let expected = vec![node(
            "root",
            true,
            0,
            10,
            10,
            vec![node("child", true, 0, 5, 5, vec![])],
        )];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_drops_parent_when_both_are_application() {
        let root = node(
            "root",
            true,
            0,
            10,
            10,
            vec![node("child", true, 0, 10, 10, vec![])],
        );
        let expected = vec![node("child", true, 0, 10, 10, vec![])];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_drops_parent_when_both_are_system() {
        let root = node(
            "root",
            false,
            0,
            10,
            10,
            vec![node("child", false, 0, 10, 10, vec![])],
        );
        let expected = vec![node("child", false, 0, 10, 10, vec![])];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_absorbs_system_child_of_application_parent() {
        let root = node(
            "root",
            true,
            0,
            10,
            10,
            vec![node("child", false, 0, 10, 10, vec![])],
        );
        let expected = vec![node("root", true, 0, 10, 10, vec![])];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_removes_nameless_subtrees_entirely() {
        let root = node(
            "",
            true,
            0,
            10,
            1,
            vec![
                node(
                    "",
                    true,
                    0,
                    5,
                    1,
                    vec![node("", true, 0, 5, 1, vec![node("", false, 0, 5, 1, vec![])])],
                ),
                node("", false, 5, 10, 1, vec![]),
            ],
        );
        assert_eq!(root.collapse(), vec![]);
    }

    #[test]
    fn test_collapse_deeply_nested_chains() {
        let root = node(
            "root",
            true,
            0,
            10,
            10,
            vec![
                node(
                    "child1-1",
                    false,
                    0,
                    5,
                    5,
                    vec![node(
                        "child2-1",
                        true,
                        0,
                        5,
                        5,
                        vec![node("child3-1", false, 0, 5, 5, vec![])],
                    )],
                ),
                node(
                    "child1-2",
                    false,
                    5,
                    10,
                    5,
                    vec![node(
                        "",
                        true,
                        5,
                        10,
                        5,
                        vec![node("child3-1", false, 5, 10, 5, vec![])],
                    )],
                ),
            ],
        );
        let expected = vec![node(
            "root",
            true,
            0,
            10,
            10,
            vec![
                node("child2-1", true, 0, 5, 5, vec![]),
                node("child3-1", false, 5, 10, 5, vec![]),
            ],
        )];
        assert_eq!(root.collapse(), expected);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let build = || {
            node(
                "root",
                true,
                0,
                10,
                10,
                vec![
                    node(
                        "child1-1",
                        false,
                        0,
                        5,
                        5,
                        vec![node("child2-1", true, 0, 5, 5, vec![])],
                    ),
                    node("", true, 5, 10, 5, vec![node("child1-2", false, 5, 10, 5, vec![])]),
                ],
            )
        };

        let once: Vec<Node> = build().collapse();
        let twice: Vec<Node> = once
            .clone()
            .into_iter()
            .flat_map(Node::collapse)
            .collect();
        assert_eq!(once, twice);
    }
}
