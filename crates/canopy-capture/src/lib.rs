//! Accessibility node graph capture.
//!
//! The platform's accessibility framework hands out manually reference-counted
//! node handles over a graph that may contain cycles. This crate flattens that
//! graph, one window at a time, into the serializable forest model of
//! `canopy-core`: the [`walker`] canonicalizes one window, the [`assembler`]
//! snapshots every visible window in one capture, and [`source`] defines the
//! boundary the platform integration implements. [`synthetic`] is a scripted
//! in-memory source for tests and demos.

pub mod assembler;
pub mod source;
pub mod synthetic;
pub mod walker;

pub use assembler::capture_forest;
pub use source::{
    AccessibilitySource, CaptureError, HandleLost, NodeFacts, NodeHandle, SpanFacts, WindowFacts,
    WindowHandle,
};
pub use synthetic::{SyntheticGraph, SyntheticSource};
pub use walker::walk_window;
