//! The accessibility-service boundary.
//!
//! The platform framework owns the node graph; canopy only ever sees it
//! through the traits below. Handles are manually reference-counted on the
//! platform side, so every handle type must release its reference in `Drop` —
//! the walker then gets scoped acquisition with guaranteed release on every
//! exit path for free, including early aborts and panics.

use canopy_core::model::{NodeAction, Rect, SpanSource, WindowType};
use thiserror::Error;

/// The underlying platform node went away while we held a handle to it.
///
/// Recovered locally: the walker truncates the affected subtree and keeps
/// everything built so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node handle no longer valid")]
pub struct HandleLost;

/// Errors surfaced by an [`AccessibilitySource`].
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("window enumeration failed: {0}")]
    WindowEnumeration(String),
}

/// One clickable span as read off a platform node, before id resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanFacts {
    pub text: String,
    pub url: Option<String>,
    pub source: SpanSource,
    pub start: i32,
}

/// Raw attribute snapshot of one platform node.
///
/// `labeled_by` / `label_for` carry *handle identities* (see
/// [`NodeHandle::identity`]); the walker resolves them to `unique_id`s after
/// the whole tree is materialized, never through live handles.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFacts {
    pub bounds: Rect,
    pub class_name: Option<String>,
    pub text: Option<String>,
    pub content_description: Option<String>,
    pub hint_text: Option<String>,
    pub package_name: Option<String>,
    pub text_selection_start: i32,
    pub text_selection_end: i32,
    pub view_id_resource_name: Option<String>,
    pub window_id: i32,
    pub is_checkable: bool,
    pub is_checked: bool,
    pub is_clickable: bool,
    pub is_editable: bool,
    pub is_enabled: bool,
    pub is_focusable: bool,
    pub is_focused: bool,
    pub is_long_clickable: bool,
    pub is_password: bool,
    pub is_scrollable: bool,
    pub is_selected: bool,
    pub is_visible_to_user: bool,
    pub actions: Vec<NodeAction>,
    pub clickable_spans: Vec<SpanFacts>,
    pub labeled_by: Option<u64>,
    pub label_for: Option<u64>,
    pub drawing_order: i32,
    pub tooltip_text: Option<String>,
}

impl Default for NodeFacts {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            class_name: None,
            text: None,
            content_description: None,
            hint_text: None,
            package_name: None,
            text_selection_start: -1,
            text_selection_end: -1,
            view_id_resource_name: None,
            window_id: 0,
            is_checkable: false,
            is_checked: false,
            is_clickable: false,
            is_editable: false,
            is_enabled: false,
            is_focusable: false,
            is_focused: false,
            is_long_clickable: false,
            is_password: false,
            is_scrollable: false,
            is_selected: false,
            is_visible_to_user: false,
            actions: Vec::new(),
            clickable_spans: Vec::new(),
            labeled_by: None,
            label_for: None,
            drawing_order: 0,
            tooltip_text: None,
        }
    }
}

/// Window metadata as read off a platform window handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowFacts {
    pub bounds: Rect,
    pub display_id: i32,
    pub id: i32,
    pub layer: i32,
    pub title: Option<String>,
    pub window_type: WindowType,
    pub is_accessibility_focused: bool,
    pub is_active: bool,
    pub is_focused: bool,
    pub is_in_picture_in_picture_mode: bool,
}

/// An exclusively owned reference to one platform node.
///
/// The graph behind handles is directed and not guaranteed acyclic; the same
/// underlying node may be reachable through several paths. `identity` is what
/// makes traversal terminate.
pub trait NodeHandle: Sized {
    /// Identity of the underlying node, stable for the duration of one
    /// capture. Two handles to the same node report the same identity.
    fn identity(&self) -> u64;

    /// Read the full attribute set in one pass. Called exactly once per
    /// visited node, before any child handle is obtained.
    fn facts(&self) -> Result<NodeFacts, HandleLost>;

    /// Obtain owned handles to the node's children, in layout order.
    fn children(&self) -> Result<Vec<Self>, HandleLost>;
}

/// An exclusively owned reference to one platform window.
pub trait WindowHandle {
    type Node: NodeHandle;

    /// Window metadata, snapshotted at enumeration time.
    fn facts(&self) -> WindowFacts;

    /// Obtain the window's root node handle. `Ok(None)` when the window
    /// currently has no tree; `Err` when the window itself went away.
    fn root(&self) -> Result<Option<Self::Node>, HandleLost>;
}

/// Supplies the currently visible windows, top-most first.
///
/// Implemented by the platform integration; canopy never reimplements the
/// accessibility framework itself.
pub trait AccessibilitySource {
    type Window: WindowHandle;

    fn windows(&mut self) -> Result<Vec<Self::Window>, CaptureError>;
}
