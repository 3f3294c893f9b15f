//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the external collaborators of the
//! ingestion pipeline:
//! - Blob storage signing (GCS V4 signed URLs via IAM delegation)
//! - Image classification (OpenAI)
//! - Speech transcription (Google Cloud Speech-to-Text)
//! - Ticket persistence (SurrealDB)
//! - Access-token acquisition shared by the Google-facing clients
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod auth;
pub mod classifier;
pub mod db;
pub mod storage;
pub mod transcriber;
