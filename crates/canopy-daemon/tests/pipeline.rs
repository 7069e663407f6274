//! End-to-end pipeline test: demo source → scheduler → link → controller.
//!
//! An in-process WebSocket peer plays the controller: it collects pushed
//! forests and can issue pull-requests, exactly as the remote side would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use canopy_capture::synthetic::SyntheticSource;
use canopy_core::flags::CaptureFlags;
use canopy_core::model::Forest;
use canopy_daemon::{
    bridge_pulls, dispatch, run_capture_worker, run_ticker, supervise_link, trigger_channel,
    ControlMessage, SwitchSink,
};
use canopy_transport::channel::WsConnector;
use canopy_transport::sink::ForestSink;
use canopy_transport::wire::{ClientToServer, ServerToClient};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

fn control(action: &str, host: Option<&str>, port: Option<i32>) -> ControlMessage {
    ControlMessage {
        action: action.to_string(),
        host: host.map(str::to_string),
        port,
    }
}

/// Spawn the controller peer. Forests pushed by the device come out of the
/// returned receiver; sending `()` into the returned sender issues a pull.
async fn spawn_controller() -> (
    u16,
    mpsc::UnboundedReceiver<Forest>,
    mpsc::UnboundedSender<()>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (forest_tx, forest_rx) = mpsc::unbounded_channel();
    let (pull_tx, mut pull_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Flow-control ack on connect, as the real peer sends.
        let ack = serde_json::to_string(&ServerToClient::ack()).unwrap();
        ws.send(Message::Text(ack)).await.unwrap();

        loop {
            tokio::select! {
                cmd = pull_rx.recv() => match cmd {
                    Some(()) => {
                        let pull = serde_json::to_string(&ServerToClient::pull()).unwrap();
                        if ws.send(Message::Text(pull)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                message = ws.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientToServer::Forest(forest)) = serde_json::from_str(&text) {
                            let _ = forest_tx.send(forest);
                        }
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
            }
        }
    });

    (port, forest_rx, pull_tx)
}

#[tokio::test]
async fn captures_stream_while_enabled_and_pulls_work_while_disabled() {
    let flags: &'static CaptureFlags = Box::leak(Box::new(CaptureFlags::new()));
    flags.set_capture_period(Duration::from_millis(50));

    let (port, mut forests, pulls) = spawn_controller().await;

    let stop = Arc::new(AtomicBool::new(false));
    let sinks = Arc::new(SwitchSink::new());
    let (trigger_tx, trigger_rx) = trigger_channel();
    let (pull_tx, pull_rx) = mpsc::channel(1);

    tokio::spawn(run_ticker(flags, trigger_tx.clone(), stop.clone()));
    tokio::spawn(bridge_pulls(pull_rx, trigger_tx.clone()));
    tokio::spawn(run_capture_worker(
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

    // Point the device at the controller and enable periodic capture, the
    // way the control plane would.
    dispatch(
        &control("set-endpoint", Some("127.0.0.1"), Some(port as i32)),
        flags,
    );
    dispatch(&control("enable-capture", None, None), flags);

    // Periodic forests arrive, one window entry per demo window.
    let first = timeout(Duration::from_secs(10), forests.recv())
        .await
        .expect("first forest within timeout")
        .expect("controller alive");
    assert_eq!(first.window_count(), 2);
    let tree = &first.windows[0].tree;
    let root = tree.root().expect("demo window has a tree");
    assert_eq!(root.unique_id, 0);
    assert_eq!(root.depth, 0);
    assert!(first.windows[1].tree.is_empty());

    timeout(Duration::from_secs(10), forests.recv())
        .await
        .expect("second forest within timeout")
        .expect("controller alive");

    // Disable. The in-flight capture may still land; after that, silence.
    dispatch(&control("disable-capture", None, None), flags);
    tokio::time::sleep(Duration::from_millis(200)).await;
    while forests.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(
        forests.try_recv().is_err(),
        "no periodic captures after disable"
    );

    // A pull is served even while periodic capture is disabled.
    pulls.send(()).unwrap();
    let pulled = timeout(Duration::from_secs(10), forests.recv())
        .await
        .expect("pulled forest within timeout")
        .expect("controller alive");
    assert_eq!(pulled.window_count(), 2);

    stop.store(true, Ordering::Relaxed);
}
