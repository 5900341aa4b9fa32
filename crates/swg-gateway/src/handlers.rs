//! API Handlers

use crate::AppState;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use swg_common::{AuditRecord, RawRequest};
use tracing::{info, warn};

/// Records returned by the logs endpoint when no limit is given
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Error body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub detail: String,
}

fn error(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { detail: detail.into() })).into_response()
}

/// Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check
pub async fn ready(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    if state.gateway.policy_version() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    /// Always `healthy`
    pub status: String,
    /// Policy document path
    pub policy_path: String,
    /// Installed policy version
    pub policy_version: u64,
    /// JSONL audit log, if enabled
    pub audit_log_path: Option<String>,
}

/// Configuration status
pub async fn status(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    let policy_path = state
        .gateway
        .policy_path()
        .unwrap_or(state.config.policy_path.as_path())
        .display()
        .to_string();

    Json(StatusResponse {
        status: "healthy".to_string(),
        policy_path,
        policy_version: state.gateway.policy_version(),
        audit_log_path: state
            .config
            .audit_log_path
            .as_ref()
            .map(|p| p.display().to_string()),
    })
}

/// Metrics endpoint
pub async fn metrics(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.gateway.stats();

    let metrics = format!(
        r#"# HELP opensase_swg_requests_total Total requests processed
# TYPE opensase_swg_requests_total counter
opensase_swg_requests_total {}

# HELP opensase_swg_allowed_total Requests allowed
# TYPE opensase_swg_allowed_total counter
opensase_swg_allowed_total {}

# HELP opensase_swg_blocked_total Requests blocked
# TYPE opensase_swg_blocked_total counter
opensase_swg_blocked_total {}

# HELP opensase_swg_policy_evaluations_total Policy engine evaluations
# TYPE opensase_swg_policy_evaluations_total counter
opensase_swg_policy_evaluations_total {}

# HELP opensase_swg_policy_version Installed policy snapshot version
# TYPE opensase_swg_policy_version gauge
opensase_swg_policy_version {}
"#,
        stats.requests,
        stats.allowed,
        stats.blocked,
        state.gateway.policy().evaluations(),
        state.gateway.policy_version(),
    );

    (StatusCode::OK, metrics)
}

// === Enforcement ===

/// Check response
#[derive(Serialize)]
pub struct CheckResponse {
    /// Final verdict
    pub allowed: bool,
    /// Audit record
    pub record: AuditRecord,
}

/// Run a request descriptor through the pipeline
///
/// Audit sinks write synchronously, so the pipeline runs on the blocking pool.
pub async fn check(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let request = RawRequest::from_value(&body);
    let gateway = Arc::clone(&state.gateway);

    match tokio::task::spawn_blocking(move || gateway.process(&request)).await {
        Ok(verdict) => Json(CheckResponse {
            allowed: verdict.allowed,
            record: verdict.record,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Pipeline task failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, "pipeline task failed")
        }
    }
}

// === Policy ===

/// Re-read the policy document
pub async fn policy_reload(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.gateway.reload_policy() {
        Ok(version) => {
            info!(version, "Policy reloaded via control API");
            Json(serde_json::json!({ "status": "ok", "version": version })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Policy reload failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Token verification request
#[derive(Deserialize)]
pub struct TokenVerifyRequest {
    /// Credential to check
    pub token: String,
}

/// Token verification response
#[derive(Serialize)]
pub struct TokenVerifyResponse {
    /// Resolved user
    pub user: String,
    /// Always `valid`
    pub status: String,
}

/// Validate a credential against the current policy snapshot
pub async fn token_verify(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<TokenVerifyRequest>,
) -> Response {
    let result = state.gateway.validate_credential(Some(&req.token));
    match result.user {
        Some(user) if result.valid => Json(TokenVerifyResponse {
            user,
            status: "valid".to_string(),
        })
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, result.reason),
    }
}

// === Audit ===

/// Logs query
#[derive(Deserialize)]
pub struct LogsQuery {
    /// Maximum records to return
    pub limit: Option<i64>,
}

/// Most recent audit records, oldest first
pub async fn logs(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    if limit <= 0 {
        return error(StatusCode::BAD_REQUEST, "limit must be positive");
    }

    let records = state
        .gateway
        .memory_log()
        .map(|log| log.recent(usize::try_from(limit).unwrap_or(usize::MAX)))
        .unwrap_or_default();

    Json(records).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::{build_router, GatewayConfig, SecureWebGateway};
    use axum::body::Body;
    use axum::http::Request;
    use swg_dlp::PayloadInspector;
    use swg_filter::{DestinationClassifier, DomainBlocklist, UrlCategorizer};
    use swg_policy::{DeviceTrust, PolicyEngine, PolicyStore};
    use tower::ServiceExt;

    fn state_with_policy(store: PolicyStore) -> Arc<AppState> {
        let policy = PolicyEngine::new(Arc::new(store), DeviceTrust::default());
        let gateway = SecureWebGateway::new(policy, PayloadInspector::with_defaults().unwrap())
            .with_classifier(DestinationClassifier::new(
                DomainBlocklist::from_domains(["malware.test"]),
                UrlCategorizer::new(),
            ))
            .with_memory_log(Arc::new(MemorySink::new(10)));
        Arc::new(AppState::new(Arc::new(gateway), GatewayConfig::default()))
    }

    fn state() -> Arc<AppState> {
        state_with_policy(PolicyStore::default())
    }

    async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(state(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready() {
        let (status, _) = send(state(), get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status() {
        let (status, body) = send(state(), get("/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["policy_version"], 1);
        assert_eq!(body["policy_path"], "config/policies.yaml");
        assert!(body["audit_log_path"].is_null());
    }

    #[tokio::test]
    async fn test_check_and_logs() {
        let state = state();

        let (status, body) = send(
            state.clone(),
            post_json(
                "/api/v1/check",
                serde_json::json!({"url": "http://malware.test/payload", "token": "token-alice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["record"]["reasons"][0], "matched threat blocklist");
        assert_eq!(body["record"]["user"], "alice");

        let (status, body) = send(
            state.clone(),
            post_json(
                "/api/v1/check",
                serde_json::json!({"url": "http://example.com/docs", "credential": "token-bob"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);

        let (status, body) = send(state.clone(), get("/api/v1/logs?limit=1")).await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["domain"], "example.com");

        let (_, body) = send(state, get("/api/v1/logs")).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_check_rejects_non_string_method() {
        let (status, body) = send(
            state(),
            post_json(
                "/api/v1/check",
                serde_json::json!({"url": "http://a.test/", "method": 7, "token": "token-bob"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["record"]["method"], "7");
        assert_eq!(body["record"]["reasons"][0], "unsupported method: 7");
    }

    #[tokio::test]
    async fn test_logs_rejects_non_positive_limit() {
        let (status, body) = send(state(), get("/api/v1/logs?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "limit must be positive");
    }

    #[tokio::test]
    async fn test_token_verify() {
        let (status, body) = send(
            state(),
            post_json("/api/v1/token/verify", serde_json::json!({"token": "token-bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "bob");
        assert_eq!(body["status"], "valid");

        let (status, body) = send(
            state(),
            post_json("/api/v1/token/verify", serde_json::json!({"token": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "invalid credential");
    }

    #[tokio::test]
    async fn test_policy_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        std::fs::write(&path, "default_policy:\n  blocked_domains: [example.com]\n").unwrap();
        let state = state_with_policy(PolicyStore::open(&path).unwrap());

        let (status, body) =
            send(state.clone(), post_json("/api/v1/policy/reload", Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], 2);

        std::fs::write(&path, "default_policy: [unterminated").unwrap();
        let (status, body) =
            send(state.clone(), post_json("/api/v1/policy/reload", Value::Null)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].is_string());
        assert_eq!(state.gateway.policy_version(), 2);
    }

    #[tokio::test]
    async fn test_metrics() {
        let state = state();
        state.gateway.process(&RawRequest::new("http://example.com/").credential("token-bob"));

        let response = build_router(state).oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("opensase_swg_requests_total 1"));
        assert!(text.contains("opensase_swg_allowed_total 1"));
        assert!(text.contains("opensase_swg_policy_version 1"));
    }
}
