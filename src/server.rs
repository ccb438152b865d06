use crate::error::Error;
use crate::pipeline::{Outcome, Pipeline, ProcessOptions};
use crate::prompt::ExtractionMode;
use crate::providers::ModelCatalog;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub catalog: Arc<ModelCatalog>,
}

/// Request body for POST /api/invite
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    /// Raw page content to extract events from
    pub content: String,
    /// Optional free-text instructions for the model
    #[serde(default)]
    pub instructions: Option<String>,
    /// URL of the originating page
    #[serde(default)]
    pub source_url: Option<String>,
    /// Extract all related events instead of only the primary one
    #[serde(default)]
    pub multi_day: bool,
    /// Mark the whole batch tentative
    #[serde(default)]
    pub tentative: bool,
    /// Hold for review instead of sending immediately
    #[serde(default)]
    pub review: bool,
}

/// Request body for POST /api/confirm
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

/// Build the HTTP API router for the host environment
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/invite", post(invite_handler))
        .route("/api/confirm", post(confirm_handler))
        .route("/api/models", get(models_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}

async fn invite_handler(
    State(state): State<AppState>,
    Json(request): Json<InviteRequest>,
) -> Result<Json<Outcome>, ApiError> {
    let options = ProcessOptions {
        instructions: request.instructions,
        source_url: request.source_url,
        mode: if request.multi_day {
            ExtractionMode::MultiDay
        } else {
            ExtractionMode::Primary
        },
        tentative: request.tentative,
        review: request.review,
    };

    let outcome = state.pipeline.process(&request.content, &options).await?;
    Ok(Json(outcome))
}

async fn confirm_handler(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.pipeline.confirm(&request.token).await?;
    Ok(Json(outcome))
}

async fn models_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let models = state.catalog.list_models().await?;
    Ok(Json(json!({ "models": models })))
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Error wrapper mapping the taxonomy onto HTTP responses
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::ProviderHttp { .. }
            | Error::Provider(_)
            | Error::MalformedResponse(_)
            | Error::SchemaViolation(_)
            | Error::DispatchFailed { .. } => StatusCode::BAD_GATEWAY,
            Error::InvalidToken => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!("Request failed: {:?}", self.0);

        let mut body = json!({
            "error": self.0.to_string(),
            "code": code(&self.0),
        });
        // Expose the retry token so the host can re-attempt dispatch
        if let Error::DispatchFailed { token, .. } = &self.0 {
            body["token"] = json!(token);
        }

        (status, Json(body)).into_response()
    }
}

fn code(err: &Error) -> &'static str {
    match err {
        Error::Config(_) => "config",
        Error::ProviderTimeout { .. } => "provider_timeout",
        Error::ProviderHttp { .. } => "provider_http",
        Error::Provider(_) => "provider",
        Error::MalformedResponse(_) => "malformed_response",
        Error::SchemaViolation(_) => "schema_violation",
        Error::InvalidToken => "invalid_token",
        Error::DispatchFailed { .. } => "dispatch_failed",
        Error::Io(_) => "io",
        Error::Serialization(_) => "serialization",
        Error::Other(_) => "other",
    }
}
