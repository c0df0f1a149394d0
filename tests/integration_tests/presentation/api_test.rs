use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose;
use tower::ServiceExt;

use dubgate::application::ports::{LlmClient, ModelLoader, OutputStore};
use dubgate::application::services::{
    InferenceService, ModelRuntime, PromptAugmenter, RequestLimits, RetryPolicy,
    SeparationService, WeightCache,
};
use dubgate::infrastructure::storage::LocalOutputStore;
use dubgate::presentation::{AppState, create_router};

use crate::helpers::{LlmBehavior, MockFetcher, MockLlmClient, MockLoader, MockModel, wav_bytes};

const BOUNDARY: &str = "dubgate-test-boundary";

struct TestApp {
    router: Router,
    runtime: Arc<ModelRuntime>,
    loader: Arc<MockLoader>,
    llm: Arc<MockLlmClient>,
    _cache_dir: tempfile::TempDir,
    _output_dir: tempfile::TempDir,
}

fn build_app(loader: MockLoader, llm: LlmBehavior, load_wait: Duration) -> TestApp {
    build_app_with_body_limit(loader, llm, load_wait, 16 * 1024 * 1024)
}

fn build_app_with_body_limit(
    loader: MockLoader,
    llm: LlmBehavior,
    load_wait: Duration,
    body_limit_bytes: usize,
) -> TestApp {
    let cache_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let cache = Arc::new(WeightCache::new(
        cache_dir.path().to_path_buf(),
        Vec::new(),
        Arc::new(MockFetcher::succeeding(b"")),
        RetryPolicy::default(),
    ));
    let loader = Arc::new(loader);
    let runtime = Arc::new(ModelRuntime::new(
        cache,
        Arc::clone(&loader) as Arc<dyn ModelLoader>,
        None,
    ));
    let llm = Arc::new(MockLlmClient::new(llm));
    let augmenter = Arc::new(PromptAugmenter::new(
        Some(Arc::clone(&llm) as Arc<dyn LlmClient>),
        Duration::from_millis(50),
        "Person speaking".to_string(),
    ));
    let inference_service = Arc::new(InferenceService::new(
        Arc::clone(&runtime),
        augmenter,
        RequestLimits::default(),
        load_wait,
    ));
    let store: Arc<dyn OutputStore> =
        Arc::new(LocalOutputStore::new(output_dir.path().to_path_buf()).unwrap());
    let separation_service = Arc::new(SeparationService::new(
        Arc::clone(&inference_service),
        store,
    ));

    let router = create_router(AppState {
        inference_service,
        separation_service,
        body_limit_bytes,
    });

    TestApp {
        router,
        runtime,
        loader,
        llm,
        _cache_dir: cache_dir,
        _output_dir: output_dir,
    }
}

fn default_app() -> TestApp {
    build_app(
        MockLoader::new(MockModel::new()),
        LlmBehavior::Reply("Steady rain on metal"),
        Duration::from_secs(2),
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn synthesize(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/synthesize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_separate(file: Option<&[u8]>, description: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(description) = description {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.wav\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v1/separate")
        .header(header::HOST, "dub.local:8000")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn given_fresh_server_when_checking_health_then_reports_loading() {
    let app = default_app();

    let health = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], "loading");

    let ready = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn given_loaded_model_when_checking_health_then_reports_ready() {
    let app = default_app();
    app.runtime.get_or_load().await.unwrap();

    let health = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(body_json(health).await["status"], "ready");

    let ready = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_failed_initialization_when_checking_health_then_reports_failed() {
    let app = build_app(
        MockLoader::new(MockModel::new()).failing_first(1),
        LlmBehavior::Reply("x"),
        Duration::from_secs(2),
    );
    assert!(app.runtime.get_or_load().await.is_err());

    let health = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let json = body_json(health).await;
    assert_eq!(json["status"], "failed");
    assert!(json["reason"].as_str().unwrap().contains("corrupt"));

    let ready = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn given_valid_prompt_when_synthesizing_then_returns_wav_with_metadata_headers() {
    let app = default_app();

    let response = app
        .router
        .oneshot(synthesize(serde_json::json!({ "prompt": "rain", "seed": 7 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(headers["x-sample-rate"], "8000");
    assert_eq!(headers["x-duration-secs"], "0.100");
    assert_eq!(headers["x-prompt-augmented"], "true");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(app.loader.loads(), 1);
}

#[tokio::test]
async fn given_blank_prompt_when_synthesizing_then_rejected_before_model_or_llm() {
    let app = default_app();

    let response = app
        .router
        .oneshot(synthesize(serde_json::json!({ "prompt": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_kind"], "validation_error");
    assert_eq!(app.loader.loads(), 0);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn given_out_of_range_guidance_when_synthesizing_then_validation_error() {
    let app = default_app();

    let response = app
        .router
        .oneshot(synthesize(
            serde_json::json!({ "prompt": "rain", "guidance_scale": 99.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.loader.loads(), 0);
}

#[tokio::test]
async fn given_malformed_json_when_synthesizing_then_validation_error() {
    let app = default_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/synthesize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"prompt\": 42"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_kind"], "validation_error");
}

#[tokio::test]
async fn given_invalid_base64_reference_when_synthesizing_then_validation_error() {
    let app = default_app();

    let response = app
        .router
        .oneshot(synthesize(serde_json::json!({
            "prompt": "rain",
            "reference_audio": "%%% not base64 %%%"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.loader.loads(), 0);
}

#[tokio::test]
async fn given_unsupported_reference_type_when_synthesizing_then_validation_error() {
    let app = default_app();

    let response = app
        .router
        .oneshot(synthesize(serde_json::json!({
            "prompt": "rain",
            "reference_audio": general_purpose::STANDARD.encode(b"hello"),
            "reference_mime_type": "text/plain"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.loader.loads(), 0);
}

#[tokio::test]
async fn given_augmentation_timeout_when_synthesizing_then_original_prompt_is_used() {
    let app = build_app(
        MockLoader::new(MockModel::new()),
        LlmBehavior::Hang,
        Duration::from_secs(2),
    );

    let response = app
        .router
        .oneshot(synthesize(serde_json::json!({ "prompt": "rain" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-prompt-augmented"], "false");
    assert_eq!(app.llm.calls(), 1);
}

#[tokio::test]
async fn given_model_still_loading_when_wait_elapses_then_returns_503() {
    let app = build_app(
        MockLoader::new(MockModel::new()).with_delay(Duration::from_millis(500)),
        LlmBehavior::Reply("x"),
        Duration::from_millis(50),
    );

    let response = app
        .router
        .oneshot(synthesize(
            serde_json::json!({ "prompt": "rain", "augment": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error_kind"], "model_unavailable");
}

#[tokio::test]
async fn given_failed_model_when_synthesizing_then_returns_model_unavailable() {
    let app = build_app(
        MockLoader::new(MockModel::new()).failing_first(1),
        LlmBehavior::Reply("x"),
        Duration::from_secs(2),
    );

    let response = app
        .router
        .oneshot(synthesize(
            serde_json::json!({ "prompt": "rain", "augment": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error_kind"], "model_unavailable");
}

#[tokio::test]
async fn given_uploaded_media_when_separating_then_stems_can_be_fetched_and_deleted() {
    let app = build_app(
        MockLoader::new(MockModel::new()),
        LlmBehavior::Reply("Man speaking"),
        Duration::from_secs(2),
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_separate(Some(&wav_bytes(800)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let job_id = json["job_id"].as_str().unwrap().to_string();
    assert_eq!(json["description"], "Man speaking");
    assert_eq!(
        json["speech_url"],
        format!("http://dub.local:8000/files/{job_id}/speech.wav")
    );
    assert_eq!(
        json["background_url"],
        format!("http://dub.local:8000/files/{job_id}/background.wav")
    );

    let request = app.llm.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.media.unwrap().mime_type, "audio/wav");

    let file = app
        .router
        .clone()
        .oneshot(get(&format!("/files/{job_id}/speech.wav")))
        .await
        .unwrap();
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(file.headers()[header::CONTENT_TYPE], "audio/wav");

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/files/{job_id}"))
        .body(Body::empty())
        .unwrap();
    let deleted = app.router.clone().oneshot(delete).await.unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await["status"], "deleted");

    let again = Request::builder()
        .method("DELETE")
        .uri(format!("/files/{job_id}"))
        .body(Body::empty())
        .unwrap();
    let missing = app.router.clone().oneshot(again).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error_kind"], "not_found");

    let gone = app
        .router
        .oneshot(get(&format!("/files/{job_id}/speech.wav")))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_description_when_separating_then_it_is_refined_not_replaced_by_speaker_prompt() {
    let app = default_app();

    let response = app
        .router
        .oneshot(multipart_separate(Some(&wav_bytes(800)), Some("girl talking")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request = app.llm.last_request.lock().unwrap().clone().unwrap();
    assert!(request.instruction.contains("girl talking"));
}

#[tokio::test]
async fn given_no_file_when_separating_then_validation_error() {
    let app = default_app();

    let response = app
        .router
        .oneshot(multipart_separate(None, Some("speaker")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_kind"], "validation_error");
    assert_eq!(app.loader.loads(), 0);
}

#[tokio::test]
async fn given_malformed_job_id_when_fetching_file_then_not_found() {
    let app = default_app();

    let response = app
        .router
        .oneshot(get("/files/not-a-job/speech.wav"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_kind"], "not_found");
}

#[tokio::test]
async fn given_any_request_when_handled_then_response_has_request_id() {
    let app = default_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

fn small_body_app() -> TestApp {
    build_app_with_body_limit(
        MockLoader::new(MockModel::new()),
        LlmBehavior::Reply("Steady rain on metal"),
        Duration::from_secs(2),
        4 * 1024,
    )
}

#[tokio::test]
async fn given_json_body_over_limit_when_synthesizing_then_returns_payload_too_large() {
    let app = small_body_app();
    let reference = general_purpose::STANDARD.encode(wav_bytes(8_000));

    let response = app
        .router
        .clone()
        .oneshot(synthesize(serde_json::json!({
            "prompt": "rain",
            "reference_audio": reference,
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error_kind"], "validation_error");
    assert_eq!(app.loader.loads(), 0);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn given_upload_over_limit_when_separating_then_returns_payload_too_large() {
    let app = small_body_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_separate(Some(&wav_bytes(8_000)), Some("speaker")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error_kind"], "validation_error");
    assert_eq!(app.loader.loads(), 0);
}
