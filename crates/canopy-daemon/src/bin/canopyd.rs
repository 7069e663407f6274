//! canopyd — on-device capture-and-forwarding daemon.
//!
//! Wires the pipeline together: the control-plane listener mutates the flag
//! store, the ticker and inbound pulls trigger the capture worker, and the
//! link supervisor keeps a bidi channel to the controller while capture is
//! enabled. This binary runs against the built-in demo source; a real device
//! integration supplies its own `AccessibilitySource` and reuses the same
//! wiring through `canopy_daemon`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use canopy_capture::synthetic::SyntheticSource;
use canopy_core::flags;
use canopy_daemon::{scheduler, supervisor::supervise_link, SwitchSink};
use canopy_transport::channel::WsConnector;
use canopy_transport::sink::ForestSink;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "canopyd", version, about = "On-device accessibility forest forwarder")]
struct Cli {
    /// Address of the control-plane listener.
    #[arg(long, default_value = "127.0.0.1:8300")]
    control_addr: SocketAddr,

    /// Seed the controller host at startup (control plane can change it).
    #[arg(long)]
    remote_host: Option<String>,

    /// Seed the controller port at startup; <= 0 leaves the endpoint off.
    #[arg(long)]
    remote_port: Option<i32>,

    /// Start with periodic capture enabled.
    #[arg(long)]
    enable_capture: bool,

    /// Periodic capture period in milliseconds.
    #[arg(long)]
    capture_period_ms: Option<u64>,

    /// Log filter when RUST_LOG is unset, e.g. `info` or `canopy=debug`.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let flags = flags::flags();
    if let Some(host) = cli.remote_host {
        flags.set_remote_host(host);
    }
    if let Some(port) = cli.remote_port {
        flags.set_remote_port(port);
    }
    if let Some(period_ms) = cli.capture_period_ms {
        flags.set_capture_period(Duration::from_millis(period_ms));
    }
    if cli.enable_capture {
        flags.set_capture_enabled(true);
    }

    let control_listener = TcpListener::bind(cli.control_addr)
        .await
        .with_context(|| format!("binding control listener on {}", cli.control_addr))?;
    info!(addr = %cli.control_addr, "control listener up");

    let stop = Arc::new(AtomicBool::new(false));
    let sinks = Arc::new(SwitchSink::new());
    let (trigger_tx, trigger_rx) = scheduler::trigger_channel();
    let (pull_tx, pull_rx) = mpsc::channel(1);

    tokio::spawn(canopy_daemon::serve_control(control_listener, flags));
    tokio::spawn(scheduler::run_ticker(flags, trigger_tx.clone(), stop.clone()));
    tokio::spawn(scheduler::bridge_pulls(pull_rx, trigger_tx.clone()));
    tokio::spawn(scheduler::run_capture_worker(
        SyntheticSource::demo(),
        trigger_rx,
        sinks.clone() as Arc<dyn ForestSink>,
    ));
    tokio::spawn(supervise_link(
        flags,
        Arc::new(WsConnector::default()),
        sinks.clone(),
        pull_tx,
        stop.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    stop.store(true, Ordering::Relaxed);
    drop(trigger_tx);
    Ok(())
}
