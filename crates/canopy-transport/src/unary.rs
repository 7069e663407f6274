//! Deprecated unary calls.
//!
//! `SendForest` and `SendEvent` predate the bidi stream: one payload per
//! HTTP request, one optional error string back. They are kept functionally
//! intact for old controllers and host no behavior of their own.

use async_trait::async_trait;
use canopy_core::event::EventPayload;
use canopy_core::flags::Endpoint;
use canopy_core::model::Forest;
use tracing::warn;

use crate::channel::TransportError;
use crate::sink::ForestSink;
use crate::wire::{EventRequest, EventResponse, ForestResponse};

/// HTTP client for the two legacy unary calls.
pub struct UnaryClient {
    http: reqwest::Client,
    base: String,
}

impl UnaryClient {
    pub fn new(endpoint: &Endpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("http://{endpoint}"),
        }
    }

    /// Push one forest. Returns the peer's error string, if it reported one;
    /// the call itself still completed in that case.
    #[deprecated(note = "superseded by the bidi link")]
    pub async fn send_forest(&self, forest: &Forest) -> Result<Option<String>, TransportError> {
        let response = self
            .http
            .post(format!("{}/forest", self.base))
            .json(forest)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let body: ForestResponse = response
            .json()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(body.error)
    }

    /// Push one event map. Same contract as [`Self::send_forest`].
    #[deprecated(note = "superseded by the bidi link")]
    pub async fn send_event(&self, event: &EventPayload) -> Result<Option<String>, TransportError> {
        let request = EventRequest {
            event: event.clone(),
        };
        let response = self
            .http
            .post(format!("{}/event", self.base))
            .json(&request)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let body: EventResponse = response
            .json()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(body.error)
    }
}

#[allow(deprecated)]
#[async_trait]
impl ForestSink for UnaryClient {
    async fn push_forest(&self, forest: Forest) -> Result<(), TransportError> {
        if let Some(error) = self.send_forest(&forest).await? {
            warn!("peer rejected forest: {error}");
        }
        Ok(())
    }

    async fn push_event(&self, event: EventPayload) -> Result<(), TransportError> {
        if let Some(error) = self.send_event(&event).await? {
            warn!("peer rejected event: {error}");
        }
        Ok(())
    }
}
