//! HTTP surface for the contract pipeline.
//!
//! Reproduces the hosted edge-function wire contract: POST with a JSON
//! body in and out, permissive CORS (OPTIONS preflight answers 200), and
//! per-route error envelopes — clarify/audit report `{success:false,
//! error}`, schema/generate/complete report `{error}`.

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::PipelineError;
use crate::permissions::CabinetRole;
use crate::pipeline::types::{
    AuditRequest, ClarifyRequest, CompleteRequest, GenerateRequest, SchemaRequest,
};
use crate::pipeline::ContractPipeline;
use crate::safety::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContractPipeline>,
    pub limiter: Arc<Mutex<RateLimiter>>,
}

/// How a route reports failures on the wire.
#[derive(Clone, Copy)]
enum ErrorEnvelope {
    /// `{ "success": false, "error": "..." }`
    Flagged,
    /// `{ "error": "..." }`
    Bare,
}

fn error_response(envelope: ErrorEnvelope, status: StatusCode, message: String) -> Response {
    let body = match envelope {
        ErrorEnvelope::Flagged => serde_json::json!({ "success": false, "error": message }),
        ErrorEnvelope::Bare => serde_json::json!({ "error": message }),
    };
    (status, Json(body)).into_response()
}

fn pipeline_error_response(envelope: ErrorEnvelope, error: PipelineError) -> Response {
    let status = match error {
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(envelope, status, error.to_string())
}

fn success_response<T: Serialize>(body: &T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Optional role guard: when the caller identifies its cabinet role, the
/// pipeline requires resource-creation rights. Absent header means the
/// trust boundary lives upstream.
fn check_role(headers: &HeaderMap, envelope: ErrorEnvelope) -> Result<(), Response> {
    let Some(label) = headers
        .get("x-cabinet-role")
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(());
    };
    let role = CabinetRole::parse(label);
    if role.can_create_resources() {
        Ok(())
    } else {
        info!(role = %role, "pipeline call refused by role guard");
        Err(error_response(
            envelope,
            StatusCode::FORBIDDEN,
            role.permission_denied_message().to_string(),
        ))
    }
}

async fn check_rate(state: &AppState, step: &str, envelope: ErrorEnvelope) -> Result<(), Response> {
    let allowed = state.limiter.lock().await.check_step(step);
    if allowed {
        Ok(())
    } else {
        Err(error_response(
            envelope,
            StatusCode::TOO_MANY_REQUESTS,
            "Trop de requêtes, réessayez dans une minute".to_string(),
        ))
    }
}

async fn clarify_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ClarifyRequest>,
) -> Response {
    let envelope = ErrorEnvelope::Flagged;
    if let Err(denied) = check_role(&headers, envelope) {
        return denied;
    }
    if let Err(limited) = check_rate(&state, "clarify", envelope).await {
        return limited;
    }
    match state.pipeline.clarify(&request).await {
        Ok(response) => success_response(&response),
        Err(error) => error_response(
            envelope,
            StatusCode::INTERNAL_SERVER_ERROR,
            error.to_string(),
        ),
    }
}

async fn schema_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SchemaRequest>,
) -> Response {
    let envelope = ErrorEnvelope::Bare;
    if let Err(denied) = check_role(&headers, envelope) {
        return denied;
    }
    if let Err(limited) = check_rate(&state, "schema", envelope).await {
        return limited;
    }
    match state.pipeline.generate_schema(&request).await {
        Ok(response) => success_response(&response),
        Err(error) => error_response(
            envelope,
            StatusCode::INTERNAL_SERVER_ERROR,
            error.to_string(),
        ),
    }
}

async fn audit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AuditRequest>,
) -> Response {
    let envelope = ErrorEnvelope::Flagged;
    if let Err(denied) = check_role(&headers, envelope) {
        return denied;
    }
    if let Err(limited) = check_rate(&state, "audit", envelope).await {
        return limited;
    }
    match state.pipeline.audit(&request).await {
        Ok(response) => success_response(&response),
        Err(error) => error_response(
            envelope,
            StatusCode::INTERNAL_SERVER_ERROR,
            error.to_string(),
        ),
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let envelope = ErrorEnvelope::Bare;
    if let Err(denied) = check_role(&headers, envelope) {
        return denied;
    }
    if let Err(limited) = check_rate(&state, "generate", envelope).await {
        return limited;
    }
    match state.pipeline.generate_contract(&request).await {
        Ok(response) => success_response(&response),
        Err(error) => pipeline_error_response(envelope, error),
    }
}

async fn complete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CompleteRequest>,
) -> Response {
    let envelope = ErrorEnvelope::Bare;
    if let Err(denied) = check_role(&headers, envelope) {
        return denied;
    }
    if let Err(limited) = check_rate(&state, "complete", envelope).await {
        return limited;
    }
    match state.pipeline.complete(&request).await {
        Ok(response) => success_response(&response),
        Err(error) => pipeline_error_response(envelope, error),
    }
}

async fn healthz() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

/// Build the application router. Exposed separately so tests can drive the
/// handlers in-process.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/contracts/clarify", post(clarify_handler))
        .route("/v1/contracts/schema", post(schema_handler))
        .route("/v1/contracts/audit", post(audit_handler))
        .route("/v1/contracts/generate", post(generate_handler))
        .route("/v1/contracts/complete", post(complete_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    println!("🚀 Pipeline backend ready: http://{bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
