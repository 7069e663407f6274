//! Shared data model and runtime flags for the canopy capture pipeline.

pub mod event;
pub mod flags;
pub mod model;

pub use event::{EventPayload, UiEvent};
pub use flags::{flags, CaptureFlags, Endpoint};
pub use model::{Forest, Node, Rect, Tree, Window, WindowType};
