//! The bidi link state machine.
//!
//! `Disconnected → Connecting → Open → (Closing) → Disconnected`. The driver
//! owns the channel for the lifetime of one connection: it forwards queued
//! outbound frames, watches for inbound pull-requests, and tears down on the
//! first error. Retry is delegated to a [`ReconnectPolicy`]; the default
//! ships none — whoever owns the link decides when to dial again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canopy_core::event::EventPayload;
use canopy_core::flags::Endpoint;
use canopy_core::model::Forest;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::channel::{BidiChannel, Connector, TransportError};
use crate::sink::ForestSink;
use crate::wire::ClientToServer;

/// Connection state of the link, observable through [`LinkHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Open => "open",
            LinkState::Closing => "closing",
        }
    }
}

/// Decides whether (and when) the driver dials again after a teardown.
///
/// The capture core deliberately ships no curve of its own: the controller
/// side owns reconnect behavior. Implementations plug in here.
pub trait ReconnectPolicy: Send {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` to give
    /// the connection back to the external driver.
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Called once a connection reaches `Open`.
    fn reset(&mut self) {}
}

/// The default policy: never retry internally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectPolicy for NoReconnect {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// How many outbound frames may sit unsent before pushes start dropping.
const OUTBOUND_QUEUE_DEPTH: usize = 8;

/// Cheap cloneable handle to a link: push frames, observe state.
#[derive(Clone)]
pub struct LinkHandle {
    outbound: mpsc::Sender<ClientToServer>,
    state: watch::Receiver<LinkState>,
}

impl LinkHandle {
    /// Current link state.
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// A watch receiver for state transitions.
    pub fn state_watch(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }

    fn push(&self, frame: ClientToServer, what: &str) -> Result<(), TransportError> {
        match self.outbound.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Unsent captures may be discarded under a slow channel.
                warn!("outbound queue full, {what} discarded");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TransportError::Closed),
        }
    }
}

#[async_trait]
impl ForestSink for LinkHandle {
    async fn push_forest(&self, forest: Forest) -> Result<(), TransportError> {
        self.push(ClientToServer::Forest(forest), "forest")
    }

    async fn push_event(&self, event: EventPayload) -> Result<(), TransportError> {
        self.push(ClientToServer::Event(event), "event")
    }
}

/// A link ready to run: returned by [`Link::new`] together with its handle.
pub struct LinkDriver {
    connector: Arc<dyn Connector>,
    endpoint: Endpoint,
    policy: Box<dyn ReconnectPolicy>,
    pull_tx: mpsc::Sender<()>,
    outbound_rx: mpsc::Receiver<ClientToServer>,
    state_tx: watch::Sender<LinkState>,
}

pub struct Link;

impl Link {
    /// Build a link to `endpoint`.
    ///
    /// Inbound pull-requests are forwarded into `pull_tx` with `try_send`:
    /// when a pull is already pending the new one coalesces into it. The
    /// driver future runs until every handle is dropped or the policy
    /// declines to dial again.
    pub fn new(
        connector: Arc<dyn Connector>,
        endpoint: Endpoint,
        policy: Box<dyn ReconnectPolicy>,
        pull_tx: mpsc::Sender<()>,
    ) -> (LinkHandle, LinkDriver) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let handle = LinkHandle {
            outbound: outbound_tx,
            state: state_rx,
        };
        let driver = LinkDriver {
            connector,
            endpoint,
            policy,
            pull_tx,
            outbound_rx,
            state_tx,
        };
        (handle, driver)
    }
}

/// Why one served connection ended.
enum ServeEnd {
    /// Every outbound handle was dropped; the link is done for good.
    LocalShutdown,
    /// The peer closed the channel.
    RemoteClosed,
    /// A terminal channel error.
    Failed(TransportError),
}

impl LinkDriver {
    pub async fn run(mut self) {
        let mut attempt: u32 = 0;
        loop {
            self.set_state(LinkState::Connecting);
            match self.connector.connect(&self.endpoint).await {
                Ok(mut channel) => {
                    attempt = 0;
                    self.policy.reset();
                    info!(endpoint = %self.endpoint, "link open");
                    self.set_state(LinkState::Open);
                    let end =
                        serve(channel.as_mut(), &mut self.outbound_rx, &self.pull_tx).await;
                    self.set_state(LinkState::Closing);
                    let _ = channel.close().await;
                    self.set_state(LinkState::Disconnected);
                    self.discard_unsent();
                    match end {
                        ServeEnd::LocalShutdown => {
                            debug!("link shut down locally");
                            return;
                        }
                        ServeEnd::RemoteClosed => info!("peer closed the link"),
                        ServeEnd::Failed(err) => warn!("link failed: {err}"),
                    }
                }
                Err(err) => {
                    self.set_state(LinkState::Disconnected);
                    warn!(endpoint = %self.endpoint, "handshake failed: {err}");
                }
            }

            attempt += 1;
            match self.policy.next_delay(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return,
            }
        }
    }

    fn set_state(&self, state: LinkState) {
        self.state_tx.send_replace(state);
    }

    /// Already-computed but unsent frames do not outlive the connection.
    fn discard_unsent(&mut self) {
        let mut dropped = 0usize;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded unsent frames on teardown");
        }
    }
}

/// Serve one open connection until it ends.
async fn serve(
    channel: &mut dyn BidiChannel,
    outbound_rx: &mut mpsc::Receiver<ClientToServer>,
    pull_tx: &mpsc::Sender<()>,
) -> ServeEnd {
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(frame) => {
                    if let Err(err) = channel.send(frame).await {
                        return ServeEnd::Failed(err);
                    }
                }
                None => return ServeEnd::LocalShutdown,
            },
            inbound = channel.recv() => match inbound {
                Ok(Some(frame)) => {
                    if frame.is_pull() {
                        if pull_tx.try_send(()).is_err() {
                            debug!("pull coalesced into pending capture");
                        }
                    }
                    // Frames with no request are the peer's flow-control acks.
                }
                Ok(None) => return ServeEnd::RemoteClosed,
                Err(err) => return ServeEnd::Failed(err),
            },
        }
    }
}
