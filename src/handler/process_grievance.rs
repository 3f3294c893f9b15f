//! Grievance ingestion.
//!
//! The one orchestrating handler: validates the blob references and location,
//! enriches the report through the classifier and (when audio was supplied)
//! the transcriber, then persists the ticket and returns it with its assigned
//! id and timestamp. The enrichment steps are strictly sequential; their
//! failures are absorbed by the service wrappers, so only validation and the
//! store write can fail the request.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    base::types::{AudioAnalysis, AudioReport, GeoPoint, GrievanceTicket, ImageReport, NewTicket, TicketStatus},
    runtime::Runtime,
};

use super::{ApiError, require_payload};

#[derive(Debug, Deserialize)]
pub struct ProcessGrievanceRequest {
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub text_description: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessGrievanceResponse {
    pub status: &'static str,
    pub ticket_id: String,
    pub ticket_data: GrievanceTicket,
}

#[instrument(skip_all)]
pub async fn process_grievance(
    State(runtime): State<Runtime>,
    payload: Result<Json<ProcessGrievanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessGrievanceResponse>), ApiError> {
    let request = require_payload(payload)?;

    // Validate before any external call is made.
    let (Some(image_path), Some(location)) = (request.image_path.filter(|p| !p.is_empty()), request.location) else {
        return Err(ApiError::BadRequest("Missing image_path or location.".to_string()));
    };

    info!("Processing new grievance at ({}, {}) ...", location.lat, location.lng);

    // 1. Analyze the image. Failures degrade to the fixed fallback.
    let image_analysis = runtime.classifier.classify_or_fallback(&image_path).await;

    // 2. Transcribe the audio, only when a reference was supplied.
    let audio_analysis = match request.audio_path.as_deref().filter(|p| !p.is_empty()) {
        Some(audio_path) => runtime.transcriber.transcribe_or_fallback(audio_path).await,
        None => AudioAnalysis::default(),
    };

    // 3. Persist the ticket.
    let ticket = NewTicket {
        location,
        image: ImageReport {
            url: image_path,
            category: image_analysis.category,
            ai_description: image_analysis.description,
        },
        audio: AudioReport {
            url: request.audio_path.unwrap_or_default(),
            transcription: audio_analysis.transcription,
            language: audio_analysis.language_code,
        },
        text_description: request.text_description,
    };

    let created = runtime.store.create_ticket(&ticket).await?;

    info!("Successfully created grievance ticket `{}`.", created.id);

    let response = ProcessGrievanceResponse {
        status: "success",
        ticket_id: created.id.clone(),
        ticket_data: GrievanceTicket {
            id: created.id,
            timestamp: created.timestamp.to_rfc3339(),
            status: TicketStatus::New,
            location: ticket.location,
            image: ticket.image,
            audio: ticket.audio,
            text_description: ticket.text_description,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}
