//! In-memory accessibility source.
//!
//! Backs the walker/assembler tests and the daemon's demo mode with a graph
//! whose shape, failure behavior, and handle accounting are fully scripted.
//! Handles acquired from a [`SyntheticGraph`] bump a live-handle counter and
//! release it on drop, so tests can assert that the walker never leaks a
//! platform reference.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use canopy_core::model::{Rect, WindowType};
use parking_lot::Mutex;

use crate::source::{
    AccessibilitySource, CaptureError, HandleLost, NodeFacts, NodeHandle, WindowFacts,
    WindowHandle,
};

struct SynthNode {
    facts: NodeFacts,
    children: Vec<usize>,
    fail_facts: bool,
    fail_children: bool,
}

#[derive(Default)]
struct GraphInner {
    nodes: Mutex<Vec<SynthNode>>,
    live_handles: AtomicUsize,
}

/// A scripted node graph. Cheap to clone; clones share the same graph.
#[derive(Clone, Default)]
pub struct SyntheticGraph {
    inner: Arc<GraphInner>,
}

impl SyntheticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node; returns its index (also its handle identity).
    pub fn add_node(&self, facts: NodeFacts) -> usize {
        let mut nodes = self.inner.nodes.lock();
        nodes.push(SynthNode {
            facts,
            children: Vec::new(),
            fail_facts: false,
            fail_children: false,
        });
        nodes.len() - 1
    }

    /// Add a node and link it under `parent`.
    pub fn add_child(&self, parent: usize, facts: NodeFacts) -> usize {
        let child = self.add_node(facts);
        self.link(parent, child);
        child
    }

    /// Add an edge. Cycles and diamonds are allowed — the graph only promises
    /// what the platform promises.
    pub fn link(&self, parent: usize, child: usize) {
        self.inner.nodes.lock()[parent].children.push(child);
    }

    /// Record that `node` is labeled by `by` (handle-identity reference).
    pub fn set_labeled_by(&self, node: usize, by: usize) {
        self.inner.nodes.lock()[node].facts.labeled_by = Some(by as u64);
    }

    /// Record that `node` labels `target` (handle-identity reference).
    pub fn set_label_for(&self, node: usize, target: usize) {
        self.inner.nodes.lock()[node].facts.label_for = Some(target as u64);
    }

    /// Make attribute reads on `node` fail with [`HandleLost`].
    pub fn fail_facts(&self, node: usize) {
        self.inner.nodes.lock()[node].fail_facts = true;
    }

    /// Make child enumeration on `node` fail with [`HandleLost`].
    pub fn fail_children(&self, node: usize) {
        self.inner.nodes.lock()[node].fail_children = true;
    }

    /// Acquire a handle to `node`.
    pub fn handle(&self, node: usize) -> SyntheticNode {
        self.inner.live_handles.fetch_add(1, Ordering::SeqCst);
        SyntheticNode {
            inner: Arc::clone(&self.inner),
            index: node,
        }
    }

    /// Number of handles currently held. Zero once a walk has finished.
    pub fn live_handles(&self) -> usize {
        self.inner.live_handles.load(Ordering::SeqCst)
    }
}

/// Owned handle to one synthetic node. Releases its reference on drop.
pub struct SyntheticNode {
    inner: Arc<GraphInner>,
    index: usize,
}

impl Drop for SyntheticNode {
    fn drop(&mut self) {
        self.inner.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NodeHandle for SyntheticNode {
    fn identity(&self) -> u64 {
        self.index as u64
    }

    fn facts(&self) -> Result<NodeFacts, HandleLost> {
        let nodes = self.inner.nodes.lock();
        let node = &nodes[self.index];
        if node.fail_facts {
            return Err(HandleLost);
        }
        Ok(node.facts.clone())
    }

    fn children(&self) -> Result<Vec<Self>, HandleLost> {
        let child_indices = {
            let nodes = self.inner.nodes.lock();
            let node = &nodes[self.index];
            if node.fail_children {
                return Err(HandleLost);
            }
            node.children.clone()
        };
        Ok(child_indices
            .into_iter()
            .map(|index| {
                self.inner.live_handles.fetch_add(1, Ordering::SeqCst);
                SyntheticNode {
                    inner: Arc::clone(&self.inner),
                    index,
                }
            })
            .collect())
    }
}

/// One scripted window: metadata plus an optional root node.
#[derive(Clone)]
pub struct SyntheticWindow {
    graph: SyntheticGraph,
    facts: WindowFacts,
    root: Option<usize>,
    fail_root: bool,
}

impl WindowHandle for SyntheticWindow {
    type Node = SyntheticNode;

    fn facts(&self) -> WindowFacts {
        self.facts.clone()
    }

    fn root(&self) -> Result<Option<Self::Node>, HandleLost> {
        if self.fail_root {
            return Err(HandleLost);
        }
        Ok(self.root.map(|index| self.graph.handle(index)))
    }
}

struct WindowDef {
    facts: WindowFacts,
    root: Option<usize>,
    fail_root: bool,
}

/// A scripted [`AccessibilitySource`]: a graph plus an ordered window list.
pub struct SyntheticSource {
    graph: SyntheticGraph,
    windows: Vec<WindowDef>,
    fail_enumeration: bool,
}

impl SyntheticSource {
    pub fn new(graph: SyntheticGraph) -> Self {
        Self {
            graph,
            windows: Vec::new(),
            fail_enumeration: false,
        }
    }

    pub fn graph(&self) -> &SyntheticGraph {
        &self.graph
    }

    /// Append a window backed by `root` (or none, for a window with no tree).
    pub fn push_window(&mut self, facts: WindowFacts, root: Option<usize>) {
        self.windows.push(WindowDef {
            facts,
            root,
            fail_root: false,
        });
    }

    /// Append a window whose root handle cannot be obtained.
    pub fn push_broken_window(&mut self, facts: WindowFacts) {
        self.windows.push(WindowDef {
            facts,
            root: None,
            fail_root: true,
        });
    }

    /// Make window enumeration itself fail.
    pub fn fail_enumeration(&mut self) {
        self.fail_enumeration = true;
    }

    /// A small plausible UI: an application window with a titled screen, a
    /// checkable setting and an OK button, plus a system bar with no tree.
    pub fn demo() -> Self {
        let graph = SyntheticGraph::new();
        let root = graph.add_node(NodeFacts {
            class_name: Some("android.widget.FrameLayout".into()),
            package_name: Some("com.example.settings".into()),
            bounds: Rect::new(0, 0, 1080, 1920),
            is_enabled: true,
            is_visible_to_user: true,
            ..Default::default()
        });
        graph.add_child(
            root,
            NodeFacts {
                class_name: Some("android.widget.TextView".into()),
                text: Some("Display settings".into()),
                bounds: Rect::new(0, 64, 1080, 160),
                is_enabled: true,
                is_visible_to_user: true,
                ..Default::default()
            },
        );
        graph.add_child(
            root,
            NodeFacts {
                class_name: Some("android.widget.CheckBox".into()),
                text: Some("Dark theme".into()),
                bounds: Rect::new(0, 200, 1080, 320),
                is_checkable: true,
                is_clickable: true,
                is_enabled: true,
                is_visible_to_user: true,
                ..Default::default()
            },
        );
        graph.add_child(
            root,
            NodeFacts {
                class_name: Some("android.widget.Button".into()),
                text: Some("OK".into()),
                bounds: Rect::new(760, 1700, 1040, 1840),
                is_clickable: true,
                is_enabled: true,
                is_focusable: true,
                is_visible_to_user: true,
                ..Default::default()
            },
        );

        let mut source = Self::new(graph);
        source.push_window(
            WindowFacts {
                bounds: Rect::new(0, 0, 1080, 1920),
                id: 11,
                layer: 1,
                title: Some("Settings".into()),
                window_type: WindowType::Application,
                is_active: true,
                is_focused: true,
                ..Default::default()
            },
            Some(root),
        );
        source.push_window(
            WindowFacts {
                bounds: Rect::new(0, 0, 1080, 64),
                id: 12,
                layer: 2,
                window_type: WindowType::System,
                ..Default::default()
            },
            None,
        );
        source
    }
}

impl AccessibilitySource for SyntheticSource {
    type Window = SyntheticWindow;

    fn windows(&mut self) -> Result<Vec<Self::Window>, CaptureError> {
        if self.fail_enumeration {
            return Err(CaptureError::WindowEnumeration(
                "synthetic enumeration failure".into(),
            ));
        }
        Ok(self
            .windows
            .iter()
            .map(|def| SyntheticWindow {
                graph: self.graph.clone(),
                facts: def.facts.clone(),
                root: def.root,
                fail_root: def.fail_root,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_counted_and_released() {
        let g = SyntheticGraph::new();
        let root = g.add_node(NodeFacts::default());
        g.add_child(root, NodeFacts::default());

        assert_eq!(g.live_handles(), 0);
        let handle = g.handle(root);
        assert_eq!(g.live_handles(), 1);
        let children = handle.children().unwrap();
        assert_eq!(g.live_handles(), 2);
        drop(children);
        assert_eq!(g.live_handles(), 1);
        drop(handle);
        assert_eq!(g.live_handles(), 0);
    }

    #[test]
    fn scripted_failures() {
        let g = SyntheticGraph::new();
        let node = g.add_node(NodeFacts::default());
        g.fail_facts(node);
        let handle = g.handle(node);
        assert_eq!(handle.facts(), Err(HandleLost));
        // Handle identity still readable after loss.
        assert_eq!(handle.identity(), node as u64);
    }

    #[test]
    fn demo_source_enumerates_two_windows() {
        let mut source = SyntheticSource::demo();
        let windows = source.windows().unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].facts().title.as_deref(), Some("Settings"));
        assert!(windows[1].root().unwrap().is_none());
    }
}
