//! Library root for `grievance-triage`.
//!
//! Grievance-triage ingests citizen-submitted grievance reports (an image,
//! optional audio, optional text, and a geolocation) and serves them back as
//! structured tickets:
//! - Issues short-lived, write-scoped upload URLs so clients push blobs
//!   straight to storage
//! - Classifies each image into a fixed category set with an AI description
//! - Transcribes audio notes with automatic language detection
//! - Persists tickets and serves a newest-first listing
//!
//! The service integrates with GCS for blob storage, OpenAI for image
//! classification, Google Cloud Speech-to-Text for transcription, and
//! SurrealDB for persistence. The architecture is built around extensible
//! traits that allow for different implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod handler;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the HTTP API:
/// - Initializes the crypto provider
/// - Creates the runtime context with store, classifier, transcriber, and
///   signer clients
/// - Serves the three ingestion endpoints
pub async fn start(config: Config) -> Void {
    info!("Starting grievance-triage ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
