//! Daemon wiring: control plane, capture scheduling, link supervision.

pub mod control;
pub mod scheduler;
pub mod sink;
pub mod supervisor;

pub use control::{dispatch, serve_control, ControlMessage};
pub use scheduler::{
    bridge_pulls, fire, run_capture_worker, run_event_pump, run_ticker, trigger_channel,
    CaptureTrigger,
};
pub use sink::SwitchSink;
pub use supervisor::supervise_link;
