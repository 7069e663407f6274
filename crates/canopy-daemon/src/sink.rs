//! Sink switching.
//!
//! The capture worker holds one sink for its whole life, but the link behind
//! it comes and goes with the endpoint configuration. [`SwitchSink`] is the
//! stable indirection: the link supervisor installs the current link's handle
//! and clears it on teardown; pushes with no link installed are dropped.

use async_trait::async_trait;
use canopy_core::event::EventPayload;
use canopy_core::model::Forest;
use canopy_transport::channel::TransportError;
use canopy_transport::sink::ForestSink;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct SwitchSink {
    current: RwLock<Option<Arc<dyn ForestSink>>>,
}

impl SwitchSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route pushes to `sink` from now on.
    pub fn install(&self, sink: Arc<dyn ForestSink>) {
        *self.current.write() = Some(sink);
    }

    /// Drop the current sink; pushes are discarded until the next install.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    fn snapshot(&self) -> Option<Arc<dyn ForestSink>> {
        self.current.read().clone()
    }
}

#[async_trait]
impl ForestSink for SwitchSink {
    async fn push_forest(&self, forest: Forest) -> Result<(), TransportError> {
        match self.snapshot() {
            Some(sink) => sink.push_forest(forest).await,
            None => {
                debug!("no link installed, forest discarded");
                Ok(())
            }
        }
    }

    async fn push_event(&self, event: EventPayload) -> Result<(), TransportError> {
        match self.snapshot() {
            Some(sink) => sink.push_event(event).await,
            None => {
                debug!("no link installed, event discarded");
                Ok(())
            }
        }
    }
}
