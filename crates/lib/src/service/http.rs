//! HTTP binding of [`DocumentService`] using axum.
//!
//! Routes:
//!
//! - `GET /health`
//! - `GET /documents`
//! - `GET /documents/{id}`, `GET /documents/{id}/{version}`
//! - `GET /documents/{id}/history`
//! - `GET /documents/{id}/diff?from=&to=`
//! - `POST /documents/{id}` with a [`MutationRequest`] body
//! - `POST /documents/{id}/validate` with `{"patch": [...]}`
//! - `DELETE /documents/{id}?base_version=`
//!
//! Errors are returned as an [`ErrorResponse`] body.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::{DocumentService, MutationRequest};
use crate::document::{Revision, Version};
use crate::patch::PatchOperation;

/// The axum router serving `service`.
pub fn router(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents", get(list_documents))
        .route(
            "/documents/{id}",
            get(get_latest).post(submit).delete(delete_document),
        )
        .route("/documents/{id}/history", get(history))
        .route("/documents/{id}/diff", get(diff))
        .route("/documents/{id}/validate", post(validate))
        .route("/documents/{id}/{version}", get(get_version))
        .with_state(service)
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    /// Machine-readable error class, e.g. `conflict` or `path_not_found`.
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<Version>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: String) -> Self {
        Self {
            status,
            body: ErrorResponse {
                status: status.as_u16(),
                error: error.to_string(),
                message,
                current_version: None,
            },
        }
    }

    fn bad_request(message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        let (status, code) = classify(&err);
        if status.is_server_error() {
            error!(error = %err, module = err.module(), "request failed");
        }
        let mut api_error = ApiError::new(status, code, err.to_string());
        api_error.body.current_version = err.current_version();
        api_error
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn classify(err: &crate::Error) -> (StatusCode, &'static str) {
    match err {
        crate::Error::Patch(patch_err) if !patch_err.is_invalid_pointer() => {
            (StatusCode::UNPROCESSABLE_ENTITY, patch_err.kind())
        }
        _ if err.is_invalid_request() => (StatusCode::BAD_REQUEST, "invalid_request"),
        _ if err.is_lease_expired() => (StatusCode::CONFLICT, "lease_expired"),
        _ if err.is_conflict() => (StatusCode::CONFLICT, "conflict"),
        _ if err.is_not_found() => (StatusCode::NOT_FOUND, "not_found"),
        _ if err.is_store_unavailable() => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn revision_response(status: StatusCode, revision: &Revision, body: impl Serialize) -> Response {
    let etag = format!("\"{}\"", revision.etag().as_str());
    (status, [(header::ETAG, etag)], Json(body)).into_response()
}

async fn health(State(service): State<Arc<DocumentService>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "backend": service.store().backend().kind(),
    }))
}

async fn list_documents(State(service): State<Arc<DocumentService>>) -> ApiResult<Response> {
    Ok(Json(service.list().await?).into_response())
}

async fn get_latest(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let revision = service.get(&id, None).await?;
    Ok(revision_response(StatusCode::OK, &revision, &revision))
}

async fn get_version(
    State(service): State<Arc<DocumentService>>,
    Path((id, version)): Path<(String, String)>,
) -> ApiResult<Response> {
    let version: Version = version
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid version {version:?}")))?;
    let revision = service.get(&id, Some(version)).await?;
    Ok(revision_response(StatusCode::OK, &revision, &revision))
}

async fn history(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(Json(service.history(&id).await?).into_response())
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    from: Version,
    to: Version,
}

async fn diff(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
    query: Result<Query<DiffQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(DiffQuery { from, to }) = query?;
    Ok(Json(service.diff(&id, from, to).await?).into_response())
}

async fn submit(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
    payload: Result<Json<MutationRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let outcome = service.submit(&id, request).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(revision_response(status, &outcome.revision, &outcome))
}

#[derive(Debug, Deserialize)]
struct ValidateRequest {
    patch: Vec<PatchOperation>,
}

async fn validate(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    Ok(Json(service.validate(&id, &request.patch).await?).into_response())
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    base_version: Option<Version>,
}

async fn delete_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(DeleteQuery { base_version }) = query?;
    let revision = service.delete(&id, base_version).await?;
    Ok(revision_response(StatusCode::OK, &revision, &revision))
}
