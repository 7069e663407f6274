//! Wire data model for capture snapshots.
//!
//! One capture produces a [`Forest`]: one [`Window`] per visible surface, each
//! embedding a flattened [`Tree`] of [`Node`]s. Nodes reference each other only
//! by `unique_id` — never by live platform handles — so a forest is a plain,
//! serializable value that can be shipped, stored, or diffed.
//!
//! `unique_id`s are assigned in traversal order starting at 0 and are only
//! meaningful within the capture that produced them.

use serde::{Deserialize, Serialize};

/// Bounding rectangle in screen coordinates (pixel edges, left/top inclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One action the platform reports as available on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAction {
    /// Platform action id.
    pub id: i32,

    /// Human-readable label, when the app supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Where a clickable span's text was found on the owning node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    #[default]
    Unknown,
    Text,
    ContentDescription,
}

/// A clickable region inside a node's text or content description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickableSpan {
    /// The span's own text.
    pub text: String,

    /// Link target, when the span is a URL span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Which node attribute the span was found in.
    #[serde(default)]
    pub source: SpanSource,

    /// Character offset of the span within the source attribute.
    pub start: i32,

    /// `unique_id` of the node the span belongs to (same capture).
    pub node_id: i32,
}

/// One UI element's accessibility-relevant attribute set, flattened.
///
/// All id references (`child_ids`, `labeled_by_id`, `label_for_id`, span
/// `node_id`s) resolve to nodes of the same capture or are absent; dangling
/// ids are never emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within one capture, assigned in traversal order. Root is 0.
    pub unique_id: i32,

    /// Bounding rectangle in screen coordinates.
    #[serde(default)]
    pub bounds: Rect,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    /// Selection start within `text`, -1 when there is no selection.
    #[serde(default = "minus_one")]
    pub text_selection_start: i32,

    /// Selection end within `text`, -1 when there is no selection.
    #[serde(default = "minus_one")]
    pub text_selection_end: i32,

    /// Resource name of the view id (e.g. `com.example:id/ok_button`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id_resource_name: Option<String>,

    /// Platform id of the window this node belongs to.
    #[serde(default)]
    pub window_id: i32,

    #[serde(default)]
    pub is_checkable: bool,
    #[serde(default)]
    pub is_checked: bool,
    #[serde(default)]
    pub is_clickable: bool,
    #[serde(default)]
    pub is_editable: bool,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_focusable: bool,
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub is_long_clickable: bool,
    #[serde(default)]
    pub is_password: bool,
    #[serde(default)]
    pub is_scrollable: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_visible_to_user: bool,

    /// Available actions, in platform order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NodeAction>,

    /// `unique_id`s of the node's children, in visitation order. Every entry
    /// refers to a node at `depth + 1` in the same tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<i32>,

    /// Clickable spans found in `text` or `content_description`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clickable_spans: Vec<ClickableSpan>,

    /// Distance from the root; root is 0, each child is parent + 1.
    #[serde(default)]
    pub depth: i32,

    /// `unique_id` of the node that labels this one, when it resolves in-tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labeled_by_id: Option<i32>,

    /// `unique_id` of the node this one labels, when it resolves in-tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_for_id: Option<i32>,

    /// Z-order among siblings as reported by the platform.
    #[serde(default)]
    pub drawing_order: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip_text: Option<String>,
}

fn minus_one() -> i32 {
    -1
}

/// The flattened node set of one window. May be empty when the window's root
/// was unobtainable. By convention the node with `unique_id == 0` is the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Tree {
    /// The root node, if the tree is non-empty.
    pub fn root(&self) -> Option<&Node> {
        self.get(0)
    }

    /// Look up a node by `unique_id`.
    ///
    /// Ids are assigned in append order, so the id doubles as an index.
    pub fn get(&self, unique_id: i32) -> Option<&Node> {
        if unique_id < 0 {
            return None;
        }
        self.nodes
            .get(unique_id as usize)
            .filter(|n| n.unique_id == unique_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Window kind as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    #[default]
    Unknown,
    Application,
    InputMethod,
    System,
    AccessibilityOverlay,
    SplitScreenDivider,
}

/// One accessibility-visible surface with metadata and its flattened tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Window bounds in screen coordinates.
    #[serde(default)]
    pub bounds: Rect,

    /// Display the window lives on.
    #[serde(default)]
    pub display_id: i32,

    /// Platform window id.
    #[serde(default)]
    pub id: i32,

    /// Z-order layer; higher layers are drawn on top.
    #[serde(default)]
    pub layer: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub window_type: WindowType,

    #[serde(default)]
    pub is_accessibility_focused: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub is_in_picture_in_picture_mode: bool,

    /// The window's flattened node set; empty when the root was unobtainable.
    #[serde(default)]
    pub tree: Tree,
}

/// One capture snapshot across all currently visible windows.
///
/// Exactly one entry per window handle that was offered to the capture, in
/// input order — a window whose tree could not be walked still contributes an
/// entry with an empty tree. Forests carry no identity across captures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<Window>,
}

impl Forest {
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Total node count across all windows, for logging.
    pub fn total_nodes(&self) -> usize {
        self.windows.iter().map(|w| w.tree.node_count()).sum()
    }
}
