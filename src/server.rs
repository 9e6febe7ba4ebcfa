use crate::error::QueryError;
use crate::rag::{QueryResult, RagEngine, RebuildSummary};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Number of chunks retrieved when a request does not say
pub const DEFAULT_TOP_K: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
    kind: &'static str,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("corpus rebuild failed: {0:#}")]
    Rebuild(anyhow::Error),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Query(err @ QueryError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, err.kind())
            }
            ApiError::Query(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.kind()),
            ApiError::Rebuild(_) => (StatusCode::INTERNAL_SERVER_ERROR, "rebuild_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let detail = self.to_string();

        if status.is_server_error() {
            error!("Request failed [{}]: {}", kind, detail);
        } else {
            warn!("Rejected request [{}]: {}", kind, detail);
        }

        (status, Json(ErrorResponse { detail, kind })).into_response()
    }
}

/// Build the HTTP router around a shared engine
pub fn router(engine: Arc<RagEngine>) -> Router {
    Router::new()
        .route("/ask", post(ask_question))
        .route("/refresh", post(refresh_corpus))
        .route("/health", get(health_check))
        .with_state(engine)
}

async fn ask_question(
    State(engine): State<Arc<RagEngine>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    if request.question.trim().is_empty() {
        return Err(ApiError::Validation("question must not be empty".to_string()));
    }
    if request.top_k <= 0 {
        return Err(ApiError::Validation(format!(
            "top_k must be a positive integer, got {}",
            request.top_k
        )));
    }
    let top_k = usize::try_from(request.top_k)
        .map_err(|_| ApiError::Validation(format!("top_k is too large: {}", request.top_k)))?;

    let result = engine.ask(&request.question, top_k).await?;
    Ok(Json(result))
}

async fn refresh_corpus(
    State(engine): State<Arc<RagEngine>>,
) -> Result<Json<RebuildSummary>, ApiError> {
    info!("Corpus refresh requested");
    let summary = engine.rebuild().await.map_err(ApiError::Rebuild)?;
    Ok(Json(summary))
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}
