//! `imagegate serve` — HTTP front end.
//!
//! Routes:
//! - `GET /` — liveness line
//! - `POST /generate` — `{"prompt": "...", "size"?: "..."}` → `{"image_url": ...}`
//!
//! Each request runs one guarded generation; the server itself holds no
//! per-request state.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use imagegate_core::config::Config;
use imagegate_core::{GenerationRequest, GenerationResult};
use imagegate_providers::{generate_guarded, ImageGateway, ImageGenerator};

use crate::helpers;

pub const LIVENESS_MESSAGE: &str = "✅ imagegate is live and ready to generate images!";

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ImageGenerator>,
    /// Size used when the body does not carry one.
    pub default_size: Arc<str>,
}

/// Body of `POST /generate`. Both fields are optional on the wire so that a
/// missing prompt gets the same 400 as a blank one.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/generate", post(generate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn generate(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let body: GenerateBody = serde_json::from_slice(&body).unwrap_or_else(|e| {
        warn!(error = %e, "unreadable /generate body");
        GenerateBody::default()
    });

    let prompt = body.prompt.as_deref().unwrap_or_default();
    let request = match GenerationRequest::new(prompt) {
        Ok(request) => request
            .with_size(state.default_size.as_ref())
            .with_size(body.size.unwrap_or_default()),
        Err(e) => return respond(GenerationResult::from(e)),
    };

    respond(generate_guarded(state.generator.clone(), request).await)
}

fn respond(result: GenerationResult) -> (StatusCode, Json<Value>) {
    (status_for(&result), Json(result.to_response_body()))
}

/// HTTP status for a result: 200, 400 for a rejected prompt, 500 otherwise.
pub fn status_for(result: &GenerationResult) -> StatusCode {
    match result.error_kind() {
        None => StatusCode::OK,
        Some(kind) if kind.is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ─────────────────────────────────────────────
// Command
// ─────────────────────────────────────────────

/// Run the server until Ctrl+C.
pub async fn run(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    helpers::print_banner();

    if !config.provider.is_configured() {
        warn!("provider is not fully configured; requests will fail with config_error");
    }

    let gateway = ImageGateway::from_settings(&config.provider)
        .context("failed to initialise the image gateway")?;

    info!(gateway = ?gateway, "gateway ready");

    let state = AppState {
        default_size: Arc::from(config.provider.size.as_str()),
        generator: Arc::new(gateway),
    };

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!("  Listening on http://{addr}");
    println!();
    info!(%addr, "imagegate listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("imagegate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use imagegate_core::{ErrorKind, GatewayError};
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Returns a fixed result and records what it was asked for.
    struct StubGenerator {
        result: GenerationResult,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl StubGenerator {
        fn new(result: GenerationResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ImageGenerator for StubGenerator {
        async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
            self.seen.lock().unwrap().push(request.clone());
            self.result.clone()
        }

        fn display_name(&self) -> &str {
            "stub"
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl ImageGenerator for PanickingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> GenerationResult {
            panic!("boom");
        }

        fn display_name(&self) -> &str {
            "panicking"
        }
    }

    fn app(generator: Arc<dyn ImageGenerator>) -> Router {
        router(AppState {
            generator,
            default_size: Arc::from("1024x1024"),
        })
    }

    async fn post_generate(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/generate")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = app(StubGenerator::new(GenerationResult::success("x")))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], LIVENESS_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let stub = StubGenerator::new(GenerationResult::success("https://img/1.png"));
        let (status, body) = post_generate(app(stub.clone()), r#"{"prompt": "  a red bicycle "}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"image_url": "https://img/1.png"}));

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, "a red bicycle");
        assert_eq!(seen[0].size, "1024x1024");
    }

    #[tokio::test]
    async fn test_generate_passes_size() {
        let stub = StubGenerator::new(GenerationResult::success("https://img/1.png"));
        post_generate(app(stub.clone()), r#"{"prompt": "cat", "size": "1792x1024"}"#).await;
        assert_eq!(stub.seen.lock().unwrap()[0].size, "1792x1024");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_without_upstream_call() {
        for body in [r#"{"prompt": "   "}"#, r#"{}"#, "not json"] {
            let stub = StubGenerator::new(GenerationResult::success("x"));
            let (status, json_body) = post_generate(app(stub.clone()), body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body["error"], "Prompt is required");
            assert!(stub.seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_no_image_url_includes_raw_response() {
        let stub = StubGenerator::new(GenerationResult::no_image_url(json!({"error": "denied"})));
        let (status, body) = post_generate(app(stub), r#"{"prompt": "cat"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "error": "No image URL returned",
                "kind": "no_image_url",
                "raw_response": {"error": "denied"}
            })
        );
    }

    #[tokio::test]
    async fn test_auth_failure_omits_raw_response() {
        let result = GenerationResult::from(GatewayError::Auth("az not logged in".into()));
        let (status, body) = post_generate(app(StubGenerator::new(result)), r#"{"prompt": "cat"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "auth_error");
        assert!(body.get("raw_response").is_none());
    }

    #[tokio::test]
    async fn test_panicking_generator_is_internal_error() {
        let (status, body) = post_generate(app(Arc::new(PanickingGenerator)), r#"{"prompt": "cat"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "internal_error");
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&GenerationResult::success("x")), StatusCode::OK);
        assert_eq!(
            status_for(&GenerationResult::failure(ErrorKind::InvalidPrompt, "x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&GenerationResult::failure(ErrorKind::TransportError, "x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
