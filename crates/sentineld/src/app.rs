//! HTTP routes for the analysis service.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use sentinel_core::error::MISSING_INPUT_MESSAGE;
use sentinel_core::{AnalysisService, AuditError, RawAnalysisRequest, VERSION};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Shared router state
pub struct AppState {
    pub service: AnalysisService,
}

/// Error body returned for every non-200 response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Build the router with `/api/analyze` and `/health`.
pub fn router(service: AnalysisService) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(Arc::new(AppState { service }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawAnalysisRequest>, JsonRejection>,
) -> Response {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "malformed analysis request body");
            return error_response(StatusCode::BAD_REQUEST, MISSING_INPUT_MESSAGE);
        }
    };

    match state.service.handle(raw).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => audit_error_response(&err),
    }
}

fn audit_error_response(err: &AuditError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    error_response(status, err.client_message())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use sentinel_core::{Engines, ScanConfig, SentinelConfig, GENERIC_FAILURE_MESSAGE};
    use sentinel_exec::fakes::FakeProcessRunner;
    use sentinel_upstream::fakes::{FakeExplorer, ScriptedModel};
    use sentinel_upstream::PromptRole;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const AUDIT_REPLY: &str =
        "{\"riskScore\":\"high\",\"summary\":\"Unchecked call\",\"findings\":[{\"title\":\"Reentrancy\",\"description\":\"withdraw() calls out before updating balances\",\"severity\":\"HIGH\"}]}";

    fn app(explorer: FakeExplorer, model: ScriptedModel, root: &TempDir) -> Router {
        let config = SentinelConfig {
            scan: ScanConfig {
                workspace_root: root.path().to_path_buf(),
                ..ScanConfig::default()
            },
            ..SentinelConfig::default()
        };
        let engines = Engines::new(
            Arc::new(explorer),
            Arc::new(model),
            Arc::new(FakeProcessRunner::new()),
            config,
        );
        router(AnalysisService::new(engines))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let root = TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(FakeExplorer::new(), ScriptedModel::new(), &root), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "version": VERSION}));
    }

    #[tokio::test]
    async fn test_snippet_analysis() {
        let root = TempDir::new().unwrap();
        let model = ScriptedModel::new().reply(PromptRole::Audit, AUDIT_REPLY);

        let (status, body) = send(
            app(FakeExplorer::new(), model, &root),
            post_json(r#"{"inputType":"text","input":"contract C {}"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reportType"], "text");
        assert_eq!(body["files"][0]["file"], "PastedCode.sol");
        assert_eq!(body["files"][0]["analysis"]["riskScore"], "High");
        assert_eq!(body["files"][0]["analysis"]["findings"][0]["severity"], "High");
    }

    #[tokio::test]
    async fn test_missing_input_is_bad_request() {
        let root = TempDir::new().unwrap();

        let (status, body) = send(
            app(FakeExplorer::new(), ScriptedModel::new(), &root),
            post_json(r#"{"inputType":"address"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Input type and value are required."}));
    }

    #[tokio::test]
    async fn test_unknown_input_type_is_bad_request() {
        let root = TempDir::new().unwrap();

        let (status, body) = send(
            app(FakeExplorer::new(), ScriptedModel::new(), &root),
            post_json(r#"{"inputType":"gitlab","input":"https://gitlab.com/a/b"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid input type."}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let root = TempDir::new().unwrap();

        let (status, body) = send(
            app(FakeExplorer::new(), ScriptedModel::new(), &root),
            post_json("{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], MISSING_INPUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_unverified_address_is_generic_server_error() {
        let root = TempDir::new().unwrap();
        let explorer = FakeExplorer::new().with_source("0xABC", "", None);

        let (status, body) = send(
            app(explorer, ScriptedModel::new(), &root),
            post_json(r#"{"inputType":"address","input":"0xABC"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": GENERIC_FAILURE_MESSAGE}));
    }
}
