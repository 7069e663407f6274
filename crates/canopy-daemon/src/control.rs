//! Control-plane receiver.
//!
//! A small closed set of named actions arrives out-of-band and mutates the
//! process-wide flag store. Unknown or malformed input is logged and ignored
//! — the control plane can misbehave without taking capture down.
//!
//! Delivery binding: newline-delimited JSON over TCP, one message per line,
//! e.g. `{"action":"set-endpoint","host":"192.168.0.7","port":8554}`.

use canopy_core::flags::{CaptureFlags, DEFAULT_REMOTE_HOST};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub const ACTION_ENABLE_CAPTURE: &str = "enable-capture";
pub const ACTION_DISABLE_CAPTURE: &str = "disable-capture";
pub const ACTION_SET_ENDPOINT: &str = "set-endpoint";
/// Alias kept for tooling that still speaks the old action name.
pub const ACTION_SET_ENDPOINT_LEGACY: &str = "set-grpc";

/// One parsed control message.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    pub action: String,

    /// `set-endpoint` only: controller host.
    #[serde(default)]
    pub host: Option<String>,

    /// `set-endpoint` only: controller port; `<= 0` disables the endpoint.
    #[serde(default)]
    pub port: Option<i32>,
}

/// Apply one control message to the flag store.
///
/// `set-endpoint` sets every supplied field and resets every omitted one to
/// its default — omitted fields never inherit previous values.
pub fn dispatch(message: &ControlMessage, flags: &CaptureFlags) {
    match message.action.as_str() {
        ACTION_ENABLE_CAPTURE => {
            flags.set_capture_enabled(true);
            info!("capture enabled");
        }
        ACTION_DISABLE_CAPTURE => {
            flags.set_capture_enabled(false);
            info!("capture disabled");
        }
        ACTION_SET_ENDPOINT | ACTION_SET_ENDPOINT_LEGACY => {
            let host = message
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_REMOTE_HOST.to_string());
            let port = message.port.unwrap_or(0);
            flags.set_remote_host(host.clone());
            flags.set_remote_port(port);
            info!(host, port, "endpoint updated");
        }
        other => {
            warn!("unknown control action {other:?} ignored");
        }
    }
}

/// Serve control messages until the listener fails.
///
/// Each connection is read line by line; a line that fails to parse is a
/// configuration error — logged, skipped, never fatal.
pub async fn serve_control(listener: TcpListener, flags: &'static CaptureFlags) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!("control accept failed: {err}");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                continue;
            }
        };
        debug!(%peer, "control connection");
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<ControlMessage>(line) {
                            Ok(message) => dispatch(&message, flags),
                            Err(err) => warn!("malformed control message ignored: {err}"),
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!("control read failed: {err}");
                        break;
                    }
                }
            }
            debug!(%peer, "control connection closed");
        });
    }
}
