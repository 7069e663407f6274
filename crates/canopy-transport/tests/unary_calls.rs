//! Legacy unary calls against an in-process HTTP peer.

use axum::{routing::post, Json, Router};
use canopy_core::flags::Endpoint;
use canopy_core::model::{Forest, Window};
use canopy_transport::sink::ForestSink;
use canopy_transport::unary::UnaryClient;
use canopy_transport::wire::{EventRequest, EventResponse, ForestResponse};
use tokio::net::TcpListener;

async fn spawn_peer() -> Endpoint {
    let app = Router::new()
        .route(
            "/forest",
            post(|Json(forest): Json<Forest>| async move {
                Json(ForestResponse {
                    error: if forest.windows.is_empty() {
                        Some("empty forest".into())
                    } else {
                        None
                    },
                })
            }),
        )
        .route(
            "/event",
            post(|Json(request): Json<EventRequest>| async move {
                Json(EventResponse {
                    error: if request.event.contains_key("event_type") {
                        None
                    } else {
                        Some("missing event_type".into())
                    },
                })
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Endpoint {
        host: "127.0.0.1".into(),
        port,
    }
}

#[allow(deprecated)]
#[tokio::test]
async fn send_forest_returns_peer_error_string() {
    let client = UnaryClient::new(&spawn_peer().await);

    let error = client.send_forest(&Forest::default()).await.unwrap();
    assert_eq!(error.as_deref(), Some("empty forest"));

    let forest = Forest {
        windows: vec![Window::default()],
    };
    let error = client.send_forest(&forest).await.unwrap();
    assert!(error.is_none());
}

#[allow(deprecated)]
#[tokio::test]
async fn send_event_returns_peer_error_string() {
    let client = UnaryClient::new(&spawn_peer().await);

    let event = canopy_core::UiEvent::new("TYPE_ANNOUNCEMENT").into_wire_map();
    let error = client.send_event(&event).await.unwrap();
    assert!(error.is_none());

    let empty = canopy_core::EventPayload::new();
    let error = client.send_event(&empty).await.unwrap();
    assert_eq!(error.as_deref(), Some("missing event_type"));
}

#[tokio::test]
async fn unary_binding_completes_even_when_peer_reports_an_error() {
    let client = UnaryClient::new(&spawn_peer().await);
    // The sink contract: a peer-reported error string is logged, not raised.
    client.push_forest(Forest::default()).await.unwrap();
}
