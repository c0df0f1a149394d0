use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Response};
use bytes::Bytes;
use tokio::net::TcpListener;

use dubgate::application::ports::{CompletionRequest, LlmClient, LlmClientError};
use dubgate::domain::{MediaPayload, Secret};
use dubgate::infrastructure::llm::GeminiClient;

const MODEL: &str = "gemini-2.0-flash";

#[derive(Default)]
struct Captured {
    api_key: Option<String>,
    body: Option<serde_json::Value>,
}

async fn start_mock_gemini_server(
    status: u16,
    response_body: &'static str,
) -> (String, Arc<Mutex<Captured>>, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://127.0.0.1:{}", addr.port());
    let captured = Arc::new(Mutex::new(Captured::default()));
    let captured_clone = Arc::clone(&captured);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        let route = axum::routing::post(move |headers: HeaderMap, body: Bytes| {
            let captured = Arc::clone(&captured_clone);
            async move {
                let mut captured = captured.lock().unwrap();
                captured.api_key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                captured.body = serde_json::from_slice(&body).ok();
                Response::builder()
                    .status(status)
                    .header("Content-Type", "application/json")
                    .body(Body::from(response_body))
                    .unwrap()
            }
        });

        let app = Router::new().route(&format!("/v1beta/models/{}:generateContent", MODEL), route);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (base_url, captured, shutdown_tx)
}

fn client(base_url: &str) -> GeminiClient {
    GeminiClient::new(
        base_url,
        MODEL,
        Secret::new("AIza-test-key"),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn given_successful_response_when_completing_then_returns_joined_trimmed_text() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"Woman "},{"text":"speaking\n"}]}}]}"#;
    let (base_url, captured, shutdown) = start_mock_gemini_server(200, body).await;

    let reply = client(&base_url)
        .complete(&CompletionRequest::text("describe"))
        .await
        .unwrap();

    assert_eq!(reply, "Woman speaking");
    assert_eq!(captured.lock().unwrap().api_key.as_deref(), Some("AIza-test-key"));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn given_media_when_completing_then_sends_inline_data_before_text() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"Man speaking"}]}}]}"#;
    let (base_url, captured, shutdown) = start_mock_gemini_server(200, body).await;
    let media = MediaPayload::new(Bytes::from_static(b"abc"), Some("video/mp4"), None);

    client(&base_url)
        .complete(&CompletionRequest::text("describe").with_media(Some(media)))
        .await
        .unwrap();

    let sent = captured.lock().unwrap().body.clone().unwrap();
    let parts = &sent["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "video/mp4");
    assert_eq!(parts[0]["inline_data"]["data"], "YWJj");
    assert_eq!(parts[1]["text"], "describe");
    let _ = shutdown.send(());
}

#[tokio::test]
async fn given_rate_limit_when_completing_then_returns_rate_limited() {
    let (base_url, _captured, shutdown) = start_mock_gemini_server(429, "{}").await;

    let err = client(&base_url)
        .complete(&CompletionRequest::text("describe"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmClientError::RateLimited));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn given_forbidden_when_completing_then_returns_unauthorized() {
    let (base_url, _captured, shutdown) = start_mock_gemini_server(403, "{}").await;

    let err = client(&base_url)
        .complete(&CompletionRequest::text("describe"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmClientError::Unauthorized));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn given_no_candidates_when_completing_then_returns_invalid_response() {
    let (base_url, _captured, shutdown) = start_mock_gemini_server(200, r#"{"candidates":[]}"#).await;

    let err = client(&base_url)
        .complete(&CompletionRequest::text("describe"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmClientError::InvalidResponse(_)));
    let _ = shutdown.send(());
}
