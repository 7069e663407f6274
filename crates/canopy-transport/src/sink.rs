//! The logical forwarding capability.
//!
//! There is exactly one capability — push a forest, push an event — behind
//! two bindings: the bidi link ([`crate::link::LinkHandle`]) and the
//! deprecated unary client ([`crate::unary::UnaryClient`]). Capture code
//! targets this trait and never knows which transport carries its payloads.

use async_trait::async_trait;
use canopy_core::event::EventPayload;
use canopy_core::model::Forest;

use crate::channel::TransportError;

#[async_trait]
pub trait ForestSink: Send + Sync {
    async fn push_forest(&self, forest: Forest) -> Result<(), TransportError>;

    async fn push_event(&self, event: EventPayload) -> Result<(), TransportError>;
}
