//! Forest assembler: one capture across all currently visible windows.
//!
//! This is the single "capture now" primitive — the periodic tick, inbound
//! pull-requests, and manual triggers all come through [`capture_forest`].

use canopy_core::model::{Forest, Tree, Window};
use tracing::{debug, warn};

use crate::source::{AccessibilitySource, WindowFacts, WindowHandle};
use crate::walker::walk_window;

/// Capture one [`Forest`] from the source's current window list.
///
/// Emits exactly one [`Window`] per enumerated handle, in enumeration order.
/// A window whose root is unobtainable contributes an empty tree; a failed
/// enumeration yields an empty forest. Capture errors never escape.
pub fn capture_forest<S: AccessibilitySource>(source: &mut S) -> Forest {
    let handles = match source.windows() {
        Ok(handles) => handles,
        Err(err) => {
            warn!("capture skipped: {err}");
            return Forest::default();
        }
    };

    let mut windows = Vec::with_capacity(handles.len());
    for handle in handles {
        let facts = handle.facts();
        let root = match handle.root() {
            Ok(root) => root,
            Err(_) => {
                debug!(window_id = facts.id, "window root unobtainable");
                None
            }
        };
        let tree = walk_window(root);
        windows.push(window_from_facts(facts, tree));
    }

    let forest = Forest { windows };
    debug!(
        windows = forest.window_count(),
        nodes = forest.total_nodes(),
        "forest assembled"
    );
    forest
}

fn window_from_facts(facts: WindowFacts, tree: Tree) -> Window {
    Window {
        bounds: facts.bounds,
        display_id: facts.display_id,
        id: facts.id,
        layer: facts.layer,
        title: facts.title,
        window_type: facts.window_type,
        is_accessibility_focused: facts.is_accessibility_focused,
        is_active: facts.is_active,
        is_focused: facts.is_focused,
        is_in_picture_in_picture_mode: facts.is_in_picture_in_picture_mode,
        tree,
    }
}
