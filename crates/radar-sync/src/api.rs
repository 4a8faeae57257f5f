//! # HTTP API
//!
//! JSON endpoints over [`ConfigService`].
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            HTTP API                                     │
//! │                                                                         │
//! │  GET  /health                              → "OK"                       │
//! │  GET  /facilities                          → [Facility]                 │
//! │  GET  /facilities/{id}                     → Facility                   │
//! │  PUT  /facilities/{id}/split               {"lines":[..]} | {"text":..} │
//! │  PUT  /facilities/{id}/notams              {"lines":[..]} | {"text":..} │
//! │  POST /facilities/{id}/{field}/republish                                │
//! │                                                                         │
//! │  Update response: { facility, published, warning? }                     │
//! │                                                                         │
//! │  NotFound → 404   InvalidArgument → 400   StoreUnavailable → 503        │
//! │  anything else → 500   saved-not-published → 200, published: false     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use radar_core::lines::split_lines;
use radar_core::{ConfigField, Facility};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::SyncError;
use crate::service::{ConfigService, UpdateOutcome};

// =============================================================================
// Request / Response Bodies
// =============================================================================

/// Body of a field update: a list, or free text split on `\n`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpdateRequest {
    Lines { lines: Vec<String> },
    Text { text: String },
}

impl UpdateRequest {
    fn into_lines(self) -> Vec<String> {
        match self {
            UpdateRequest::Lines { lines } => lines,
            UpdateRequest::Text { text } => split_lines(&text),
        }
    }
}

/// Body returned by update endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub facility: Facility,
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<UpdateOutcome> for UpdateResponse {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Published(facility) => UpdateResponse {
                facility,
                published: true,
                warning: None,
            },
            UpdateOutcome::SavedNotPublished { facility, error } => UpdateResponse {
                facility,
                published: false,
                warning: Some(format!("Saved, but subscribers were not notified: {}", error)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// [`SyncError`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(SyncError);

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SyncError::NotFound { .. } => StatusCode::NOT_FOUND,
            SyncError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SyncError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Router
// =============================================================================

/// Builds the API router.
pub fn router(service: ConfigService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/facilities", get(list_facilities))
        .route("/facilities/{id}", get(get_facility))
        .route("/facilities/{id}/split", put(update_split))
        .route("/facilities/{id}/notams", put(update_notices))
        .route("/facilities/{id}/{field}/republish", post(republish))
        .with_state(service)
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn list_facilities(State(service): State<ConfigService>) -> ApiResult<Json<Vec<Facility>>> {
    Ok(Json(service.list_facilities().await?))
}

async fn get_facility(
    State(service): State<ConfigService>,
    Path(id): Path<String>,
) -> ApiResult<Json<Facility>> {
    Ok(Json(service.fetch(&id).await?))
}

async fn update_split(
    State(service): State<ConfigService>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateResponse>> {
    let outcome = service.update_split(&id, body.into_lines()).await?;
    Ok(Json(outcome.into()))
}

async fn update_notices(
    State(service): State<ConfigService>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateResponse>> {
    let outcome = service.update_notices(&id, body.into_lines()).await?;
    Ok(Json(outcome.into()))
}

async fn republish(
    State(service): State<ConfigService>,
    Path((id, field)): Path<(String, String)>,
) -> ApiResult<Json<Facility>> {
    let field: ConfigField = field.parse().map_err(SyncError::from)?;
    Ok(Json(service.republish(&id, field).await?))
}
