//! Link supervision.
//!
//! The transport carries no reconnect curve of its own; this is the external
//! driver the state machine expects. While capture is enabled and a valid
//! endpoint is configured, a link is kept up; when the link ends (peer close,
//! error, endpoint dropped) the supervisor notices the flag state on its next
//! poll and dials again. Endpoint changes apply on the next dial.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use canopy_core::flags::CaptureFlags;
use canopy_transport::channel::Connector;
use canopy_transport::link::{Link, NoReconnect};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::sink::SwitchSink;

/// How often the supervisor re-checks the flag store while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Keep a link up while `capture_enabled` and the endpoint is valid.
///
/// Pull-requests from whichever link is currently open land in `pull_tx`.
/// The live link's handle is installed into `sinks` for the duration of the
/// connection.
pub async fn supervise_link(
    flags: &'static CaptureFlags,
    connector: Arc<dyn Connector>,
    sinks: Arc<SwitchSink>,
    pull_tx: mpsc::Sender<()>,
    stop: Arc<AtomicBool>,
) {
    info!("link supervisor started");
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let endpoint = match flags.endpoint() {
            Some(endpoint) if flags.capture_enabled() => endpoint,
            _ => {
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            }
        };

        debug!(%endpoint, "dialing controller");
        let (handle, driver) = Link::new(
            connector.clone(),
            endpoint,
            Box::new(NoReconnect),
            pull_tx.clone(),
        );
        sinks.install(Arc::new(handle));
        driver.run().await;
        sinks.clear();

        // Back to polling; if the flags still call for a link we dial again.
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    info!("link supervisor stopped");
}
