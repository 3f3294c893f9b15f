//! HTTP request handling for the ingestion pipeline.
//!
//! Three stateless handlers share one router: upload-URL issuance, grievance
//! ingestion, and the recent-ticket listing. Every route also answers
//! pre-flight probes, and every response carries permissive cross-origin
//! headers because the client runs on a separate origin.

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::runtime::Runtime;

pub mod list_grievances;
pub mod process_grievance;
pub mod upload_urls;

/// Build the application router.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/getUploadURLs", post(upload_urls::get_upload_urls).options(preflight))
        .route("/processGrievance", post(process_grievance::process_grievance).options(preflight))
        .route("/getGrievances", get(list_grievances::get_grievances).options(preflight))
        .with_state(runtime)
        .layer(middleware::from_fn(cross_origin_headers))
        .layer(TraceLayer::new_for_http())
}

/// Pre-flight probe: no body, permissive headers added by the middleware.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Attach the permissive cross-origin headers to every response.
async fn cross_origin_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, GET, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));

    response
}

// Errors.

/// Error surfaced to the HTTP caller.
///
/// Missing or unparsable input is the caller's fault (400); everything else
/// that escapes the handlers is reported as a server error carrying the
/// failure's message (500). Classifier and transcriber failures never reach
/// this type; their fallback policies absorb them first.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(crate::base::types::Err),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<crate::base::types::Err> for ApiError {
    fn from(err: crate::base::types::Err) -> Self {
        ApiError::Internal(err)
    }
}

/// Reject missing or unparsable JSON bodies before any field validation.
pub(crate) fn require_payload<T>(payload: Result<Json<T>, axum::extract::rejection::JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ApiError::BadRequest(format!("No valid JSON payload: {rejection}"))),
    }
}
