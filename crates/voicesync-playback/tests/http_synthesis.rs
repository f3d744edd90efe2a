//! Integration tests for `HttpSynthesisClient` against an in-process axum
//! server bound to an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use voicesync_core::{PlaybackError, SynthesisPort};
use voicesync_playback::HttpSynthesisClient;

// ── Helpers ────────────────────────────────────────────────────────

/// Serve `app` on 127.0.0.1 and return the synthesis endpoint URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/tts")
}

fn client(endpoint: &str) -> HttpSynthesisClient {
    HttpSynthesisClient::new(endpoint, Duration::from_secs(5)).unwrap()
}

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    accept: Arc<Mutex<Option<String>>>,
}

async fn record(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    *captured.body.lock().unwrap() = Some(body);
    *captured.accept.lock().unwrap() = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ([(header::CONTENT_TYPE, "audio/mpeg")], vec![7u8, 8, 9])
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn posts_json_text_and_returns_audio_bytes() {
    let captured = Captured::default();
    let app = Router::new()
        .route("/tts", post(record))
        .with_state(captured.clone());
    let endpoint = serve(app).await;

    let audio = client(&endpoint).synthesize("Hello world").await.unwrap();

    assert_eq!(audio.data.as_ref(), &[7u8, 8, 9]);
    assert_eq!(audio.content_type, "audio/mpeg");
    assert_eq!(
        captured.body.lock().unwrap().clone(),
        Some(json!({ "text": "Hello world" }))
    );
    assert_eq!(
        captured.accept.lock().unwrap().as_deref(),
        Some("audio/*")
    );
}

#[tokio::test]
async fn missing_content_type_defaults_to_wav() {
    let app = Router::new().route(
        "/tts",
        post(|| async { Response::new(Body::from(vec![1u8, 2, 3, 4])) }),
    );
    let endpoint = serve(app).await;

    let audio = client(&endpoint).synthesize("Hi").await.unwrap();

    assert_eq!(audio.len(), 4);
    assert_eq!(audio.content_type, "audio/wav");
}

#[tokio::test]
async fn server_error_maps_to_synthesis_failure_with_status() {
    let app = Router::new().route(
        "/tts",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model exploded") }),
    );
    let endpoint = serve(app).await;

    let err = client(&endpoint).synthesize("Hi").await.unwrap_err();

    assert_eq!(
        err,
        PlaybackError::SynthesisRequestFailed {
            status: Some(500),
            message: "model exploded".to_string(),
        }
    );
}

#[tokio::test]
async fn unknown_route_maps_to_synthesis_failure() {
    let app = Router::new().route("/other", post(|| async { "nope" }));
    let endpoint = serve(app).await;

    let err = client(&endpoint).synthesize("Hi").await.unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::SynthesisRequestFailed {
            status: Some(404),
            ..
        }
    ));
}

#[tokio::test]
async fn empty_payload_is_a_failure() {
    let app = Router::new().route("/tts", post(|| async { StatusCode::OK }));
    let endpoint = serve(app).await;

    let err = client(&endpoint).synthesize("Hi").await.unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::SynthesisRequestFailed {
            status: Some(200),
            ..
        }
    ));
}

#[tokio::test]
async fn connection_refused_has_no_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/tts"))
        .synthesize("Hi")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::SynthesisRequestFailed { status: None, .. }
    ));
}

#[tokio::test]
async fn slow_service_times_out() {
    let app = Router::new().route(
        "/tts",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            vec![1u8]
        }),
    );
    let endpoint = serve(app).await;
    let client = HttpSynthesisClient::new(&endpoint, Duration::from_millis(200)).unwrap();

    let err = client.synthesize("Hi").await.unwrap_err();

    assert_eq!(
        err,
        PlaybackError::SynthesisRequestFailed {
            status: None,
            message: "synthesis request timed out".to_string(),
        }
    );
}
