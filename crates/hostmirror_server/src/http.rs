//! HTTP routes.
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/health` | `ok` |
//! | GET | `/versions/{host}` | full version map |
//! | POST | `/check_updates` | entries the client lacks or holds older |
//! | GET | `/download/{host}/{filename}` | raw file content |
//!
//! Failures are returned as `{"error": "..."}` with 404 for unknown hosts or
//! files, 400 for malformed identifiers or bodies and 500 otherwise.

use crate::error::ServerError;
use crate::handler::RequestHandler;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hostmirror_protocol::{CheckUpdatesRequest, ErrorBody, HostId, VersionMap};
use tracing::error;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Builds the router serving a [`RequestHandler`].
pub fn router(handler: RequestHandler) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/versions/{host}", get(versions))
        .route("/check_updates", post(check_updates))
        .route("/download/{host}/{filename}", get(download))
        .with_state(handler)
}

async fn health() -> &'static str {
    "ok"
}

async fn versions(
    State(handler): State<RequestHandler>,
    Path(host): Path<String>,
) -> Result<Json<VersionMap>, ServerError> {
    let host = HostId::new(host)?;
    Ok(Json(handler.handle_versions(&host)?))
}

async fn check_updates(
    State(handler): State<RequestHandler>,
    body: Result<Json<CheckUpdatesRequest>, JsonRejection>,
) -> Result<Json<VersionMap>, ServerError> {
    let Json(request) = body.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    Ok(Json(handler.handle_check_updates(&request)?))
}

async fn download(
    State(handler): State<RequestHandler>,
    Path((host, filename)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let host = HostId::new(host)?;
    let data = tokio::task::spawn_blocking(move || handler.handle_download(&host, &filename))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}
