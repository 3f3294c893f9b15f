//! Upload-URL issuance.
//!
//! The client names the files it intends to upload; the handler responds with
//! a write-only signed URL and the storage path for each. Nothing is written
//! here: the upload itself goes straight from the client to the blob store.

use std::time::Duration;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::runtime::Runtime;

use super::{ApiError, require_payload};

#[derive(Debug, Deserialize)]
pub struct UploadUrlsRequest {
    #[serde(default)]
    pub image_filename: Option<String>,
    #[serde(default)]
    pub audio_filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlsResponse {
    pub image_signed_url: String,
    pub image_gs_path: String,
    pub audio_signed_url: Option<String>,
    pub audio_gs_path: Option<String>,
}

#[instrument(skip_all)]
pub async fn get_upload_urls(
    State(runtime): State<Runtime>,
    payload: Result<Json<UploadUrlsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UploadUrlsResponse>), ApiError> {
    let request = require_payload(payload)?;

    let image_filename = match request.image_filename.as_deref() {
        Some(filename) if !filename.is_empty() => filename,
        _ => return Err(ApiError::BadRequest("Missing image_filename.".to_string())),
    };

    let expiry = Duration::from_secs(runtime.config.signed_url_expiry_secs);
    let prefix = &runtime.config.upload_prefix;

    let image = runtime.signer.upload_target(prefix, image_filename, expiry).await?;

    let mut response = UploadUrlsResponse {
        image_signed_url: image.signed_url,
        image_gs_path: image.gs_path,
        audio_signed_url: None,
        audio_gs_path: None,
    };

    if let Some(audio_filename) = request.audio_filename.as_deref().filter(|f| !f.is_empty()) {
        let audio = runtime.signer.upload_target(prefix, audio_filename, expiry).await?;

        response.audio_signed_url = Some(audio.signed_url);
        response.audio_gs_path = Some(audio.gs_path);
    }

    Ok((StatusCode::OK, Json(response)))
}
