//! Process-wide runtime flags.
//!
//! A small read-mostly store mutated only by the control-plane receiver and
//! read by the capture scheduler and the transport. Each field is individually
//! coherent (atomics, or a lock held only for the single access), but there is
//! no cross-field synchronization: a reader racing a `set-endpoint` may see a
//! host from one write paired with a port from the next. That hazard is
//! deliberate — the store mirrors a single-writer/many-reader convention, and
//! callers needing atomic multi-field consistency must add their own.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Default capture period between periodic forest snapshots.
pub const DEFAULT_CAPTURE_PERIOD_MS: u64 = 100;

/// Conventional loopback alias for "the workstation running the controller".
pub const DEFAULT_REMOTE_HOST: &str = "10.0.2.2";

/// A resolved remote endpoint. Only produced when the configured port is
/// positive; `port <= 0` means the endpoint is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Runtime-togglable capture configuration.
///
/// Single writer (the control-plane receiver), many readers. Readers observe
/// an eventually-consistent snapshot; see the module docs for the host/port
/// pairing hazard.
pub struct CaptureFlags {
    capture_enabled: AtomicBool,
    capture_period_ms: AtomicU64,
    remote_host: RwLock<String>,
    remote_port: AtomicI32,
}

impl CaptureFlags {
    pub fn new() -> Self {
        Self {
            capture_enabled: AtomicBool::new(false),
            capture_period_ms: AtomicU64::new(DEFAULT_CAPTURE_PERIOD_MS),
            remote_host: RwLock::new(DEFAULT_REMOTE_HOST.to_string()),
            remote_port: AtomicI32::new(0),
        }
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled.load(Ordering::Relaxed)
    }

    pub fn set_capture_enabled(&self, enabled: bool) {
        self.capture_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn capture_period(&self) -> Duration {
        Duration::from_millis(self.capture_period_ms.load(Ordering::Relaxed))
    }

    pub fn set_capture_period(&self, period: Duration) {
        self.capture_period_ms
            .store(period.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn remote_host(&self) -> String {
        self.remote_host.read().clone()
    }

    pub fn set_remote_host(&self, host: impl Into<String>) {
        *self.remote_host.write() = host.into();
    }

    pub fn remote_port(&self) -> i32 {
        self.remote_port.load(Ordering::Relaxed)
    }

    pub fn set_remote_port(&self, port: i32) {
        self.remote_port.store(port, Ordering::Relaxed);
    }

    /// Snapshot of the remote endpoint, or `None` while it is disabled
    /// (`port <= 0`).
    ///
    /// Host and port are read back-to-back, not atomically as a pair.
    pub fn endpoint(&self) -> Option<Endpoint> {
        let port = self.remote_port();
        if port <= 0 {
            return None;
        }
        Some(Endpoint {
            host: self.remote_host(),
            port: port as u16,
        })
    }
}

impl Default for CaptureFlags {
    fn default() -> Self {
        Self::new()
    }
}

static FLAGS: Lazy<CaptureFlags> = Lazy::new(CaptureFlags::new);

/// The process-wide flag store.
pub fn flags() -> &'static CaptureFlags {
    &FLAGS
}
