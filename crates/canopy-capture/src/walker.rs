//! Node graph walker: flattens one window's node graph into a [`Tree`].
//!
//! Depth-first pre-order from the root handle. `unique_id`s are assigned in
//! visitation order starting at 0, so a node's id doubles as its index in the
//! output. A visited-set keyed on handle identity guarantees termination even
//! when the underlying graph has cycles — the framework does not promise
//! acyclicity.
//!
//! Failure containment: a handle lost mid-traversal truncates that subtree
//! only. Nodes already built, and siblings walked earlier, survive. A missing
//! root yields an empty tree, never an error.

use std::collections::{HashMap, HashSet};

use canopy_core::model::{ClickableSpan, Node, Tree};
use tracing::debug;

use crate::source::{HandleLost, NodeFacts, NodeHandle};

/// Walk one window's graph into a flattened tree.
pub fn walk_window<N: NodeHandle>(root: Option<N>) -> Tree {
    let mut walk = Walk::new();
    if let Some(root) = root {
        walk.visit(root, 0);
    }
    walk.finish()
}

/// Unresolved label references of one emitted node.
struct LabelRefs {
    node: usize,
    labeled_by: Option<u64>,
    label_for: Option<u64>,
}

struct Walk {
    nodes: Vec<Node>,
    /// Handle identities already visited; entries are never retried.
    visited: HashSet<u64>,
    /// Handle identity → assigned `unique_id`, for label resolution.
    assigned: HashMap<u64, i32>,
    labels: Vec<LabelRefs>,
}

impl Walk {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            visited: HashSet::new(),
            assigned: HashMap::new(),
            labels: Vec::new(),
        }
    }

    /// Visit one handle; returns the assigned `unique_id`, or `None` when the
    /// node was already visited or its attributes could not be read.
    ///
    /// The handle is consumed here: attributes are extracted first, child
    /// handles obtained second, and the handle itself is released before any
    /// child is descended into. Drop keeps the release guaranteed on the
    /// error paths too.
    fn visit<N: NodeHandle>(&mut self, handle: N, depth: i32) -> Option<i32> {
        let identity = handle.identity();
        if !self.visited.insert(identity) {
            return None;
        }

        let facts = match handle.facts() {
            Ok(facts) => facts,
            Err(HandleLost) => {
                debug!(identity, depth, "node lost before read, subtree skipped");
                return None;
            }
        };

        let children = match handle.children() {
            Ok(children) => children,
            Err(HandleLost) => {
                debug!(identity, depth, "children unobtainable, subtree truncated");
                Vec::new()
            }
        };
        drop(handle);

        let unique_id = self.nodes.len() as i32;
        self.assigned.insert(identity, unique_id);
        let node_index = self.nodes.len();
        self.labels.push(LabelRefs {
            node: node_index,
            labeled_by: facts.labeled_by,
            label_for: facts.label_for,
        });
        self.nodes.push(node_from_facts(unique_id, depth, facts));

        for child in children {
            if let Some(child_id) = self.visit(child, depth + 1) {
                self.nodes[node_index].child_ids.push(child_id);
            }
        }

        Some(unique_id)
    }

    /// Resolve label cross-references over the materialized node list.
    /// Identities that never got an id in this tree stay absent.
    fn finish(mut self) -> Tree {
        for refs in &self.labels {
            if let Some(identity) = refs.labeled_by {
                self.nodes[refs.node].labeled_by_id = self.assigned.get(&identity).copied();
            }
            if let Some(identity) = refs.label_for {
                self.nodes[refs.node].label_for_id = self.assigned.get(&identity).copied();
            }
        }
        Tree { nodes: self.nodes }
    }
}

fn node_from_facts(unique_id: i32, depth: i32, facts: NodeFacts) -> Node {
    let clickable_spans = facts
        .clickable_spans
        .into_iter()
        .map(|span| ClickableSpan {
            text: span.text,
            url: span.url,
            source: span.source,
            start: span.start,
            node_id: unique_id,
        })
        .collect();

    Node {
        unique_id,
        bounds: facts.bounds,
        class_name: facts.class_name,
        text: facts.text,
        content_description: facts.content_description,
        hint_text: facts.hint_text,
        package_name: facts.package_name,
        text_selection_start: facts.text_selection_start,
        text_selection_end: facts.text_selection_end,
        view_id_resource_name: facts.view_id_resource_name,
        window_id: facts.window_id,
        is_checkable: facts.is_checkable,
        is_checked: facts.is_checked,
        is_clickable: facts.is_clickable,
        is_editable: facts.is_editable,
        is_enabled: facts.is_enabled,
        is_focusable: facts.is_focusable,
        is_focused: facts.is_focused,
        is_long_clickable: facts.is_long_clickable,
        is_password: facts.is_password,
        is_scrollable: facts.is_scrollable,
        is_selected: facts.is_selected,
        is_visible_to_user: facts.is_visible_to_user,
        actions: facts.actions,
        child_ids: Vec::new(),
        clickable_spans,
        depth,
        labeled_by_id: None,
        label_for_id: None,
        drawing_order: facts.drawing_order,
        tooltip_text: facts.tooltip_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SpanFacts;
    use crate::synthetic::SyntheticGraph;
    use canopy_core::model::SpanSource;

    fn text_facts(text: &str) -> NodeFacts {
        NodeFacts {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_root_yields_empty_tree() {
        let tree = walk_window::<crate::synthetic::SyntheticNode>(None);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn preorder_ids_and_depths() {
        // root → (a → (a1, a2), b)
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let a = g.add_child(root, text_facts("a"));
        g.add_child(a, text_facts("a1"));
        g.add_child(a, text_facts("a2"));
        g.add_child(root, text_facts("b"));

        let tree = walk_window(Some(g.handle(root)));
        assert_eq!(tree.node_count(), 5);

        let texts: Vec<_> = tree
            .nodes
            .iter()
            .map(|n| n.text.as_deref().unwrap())
            .collect();
        assert_eq!(texts, ["root", "a", "a1", "a2", "b"]);

        let root_node = tree.root().unwrap();
        assert_eq!(root_node.unique_id, 0);
        assert_eq!(root_node.depth, 0);
        assert_eq!(root_node.child_ids, vec![1, 4]);

        for node in &tree.nodes {
            for &child_id in &node.child_ids {
                assert_eq!(tree.get(child_id).unwrap().depth, node.depth + 1);
            }
        }
    }

    #[test]
    fn cyclic_graph_terminates_and_emits_each_node_once() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let a = g.add_child(root, text_facts("a"));
        let b = g.add_child(a, text_facts("b"));
        // b → root closes the cycle.
        g.link(b, root);

        let tree = walk_window(Some(g.handle(root)));
        assert_eq!(tree.node_count(), 3);
        // The back-edge is not represented: a child id must always point one
        // level down, and root was already emitted.
        assert!(tree.get(2).unwrap().child_ids.is_empty());
        assert_eq!(g.live_handles(), 0);
    }

    #[test]
    fn lost_facts_skips_subtree_keeps_siblings() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let left = g.add_child(root, text_facts("left"));
        g.add_child(left, text_facts("left-child"));
        let broken = g.add_child(root, text_facts("broken"));
        g.add_child(broken, text_facts("unreachable"));
        g.add_child(root, text_facts("right"));
        g.fail_facts(broken);

        let tree = walk_window(Some(g.handle(root)));
        let texts: Vec<_> = tree
            .nodes
            .iter()
            .map(|n| n.text.as_deref().unwrap())
            .collect();
        assert_eq!(texts, ["root", "left", "left-child", "right"]);
        // Root's children skip the broken branch entirely.
        assert_eq!(tree.root().unwrap().child_ids, vec![1, 3]);
        assert_eq!(g.live_handles(), 0);
    }

    #[test]
    fn lost_children_truncates_but_keeps_node() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let mid = g.add_child(root, text_facts("mid"));
        g.add_child(mid, text_facts("dropped"));
        g.add_child(root, text_facts("tail"));
        g.fail_children(mid);

        let tree = walk_window(Some(g.handle(root)));
        let texts: Vec<_> = tree
            .nodes
            .iter()
            .map(|n| n.text.as_deref().unwrap())
            .collect();
        // "mid" survives with no children; "dropped" is truncated away.
        assert_eq!(texts, ["root", "mid", "tail"]);
        assert!(tree.get(1).unwrap().child_ids.is_empty());
        assert_eq!(g.live_handles(), 0);
    }

    #[test]
    fn every_handle_released_on_success() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        for i in 0..4 {
            let child = g.add_child(root, text_facts(&format!("c{i}")));
            g.add_child(child, text_facts(&format!("g{i}")));
        }

        let tree = walk_window(Some(g.handle(root)));
        assert_eq!(tree.node_count(), 9);
        assert_eq!(g.live_handles(), 0);
    }

    #[test]
    fn labels_resolve_in_tree_or_stay_absent() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let label = g.add_child(root, text_facts("Name:"));
        let field = g.add_child(root, text_facts("input"));
        g.set_labeled_by(field, label);
        g.set_label_for(label, field);
        // Dangling reference to a node that is never part of this window.
        let orphan = g.add_node(text_facts("elsewhere"));
        let lonely = g.add_child(root, text_facts("lonely"));
        g.set_labeled_by(lonely, orphan);

        let tree = walk_window(Some(g.handle(root)));
        let label_id = 1;
        let field_id = 2;
        assert_eq!(tree.get(field_id).unwrap().labeled_by_id, Some(label_id));
        assert_eq!(tree.get(label_id).unwrap().label_for_id, Some(field_id));
        assert_eq!(tree.get(3).unwrap().labeled_by_id, None);
    }

    #[test]
    fn spans_carry_owning_node_id() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        g.add_child(
            root,
            NodeFacts {
                text: Some("visit docs".into()),
                clickable_spans: vec![SpanFacts {
                    text: "docs".into(),
                    url: Some("https://example.com/docs".into()),
                    source: SpanSource::Text,
                    start: 6,
                }],
                ..Default::default()
            },
        );

        let tree = walk_window(Some(g.handle(root)));
        let span = &tree.get(1).unwrap().clickable_spans[0];
        assert_eq!(span.node_id, 1);
        assert_eq!(span.start, 6);
        assert_eq!(span.source, SpanSource::Text);
    }

    #[test]
    fn same_graph_walked_twice_has_identical_shape() {
        let g = SyntheticGraph::new();
        let root = g.add_node(text_facts("root"));
        let a = g.add_child(root, text_facts("a"));
        g.add_child(a, text_facts("a1"));
        g.add_child(root, text_facts("b"));

        let first = walk_window(Some(g.handle(root)));
        let second = walk_window(Some(g.handle(root)));
        assert_eq!(first.node_count(), second.node_count());
        let shape = |t: &Tree| {
            t.nodes
                .iter()
                .map(|n| (n.depth, n.child_ids.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
    }
}
