//! Speech transcription for grievance audio notes.
//!
//! Like the classifier, transcription is best-effort: callers go through
//! [`Transcriber::transcribe_or_fallback`], which absorbs every failure so a
//! speech-service outage never blocks ticket creation. The fallback text
//! embeds the error message, unlike the classifier's fixed fallback; the two
//! policies are intentionally kept distinct.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::warn;

use crate::base::types::{AudioAnalysis, Res};

pub mod speech;

// Traits.

/// Generic speech transcriber trait that clients must implement.
#[async_trait]
pub trait GenericTranscriber: Send + Sync + 'static {
    /// Transcribe the audio behind `audio_uri`, detecting the spoken language.
    ///
    /// Zero recognition results yield an all-empty analysis, not an error.
    async fn transcribe(&self, audio_uri: &str) -> Res<AudioAnalysis>;
}

// Structs.

/// Transcriber handle for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Transcriber {
    inner: Arc<dyn GenericTranscriber>,
}

impl Deref for Transcriber {
    type Target = dyn GenericTranscriber;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Transcriber {
    pub fn new(inner: Arc<dyn GenericTranscriber>) -> Self {
        Self { inner }
    }

    /// Transcribe, degrading to a failure note with an empty language code on
    /// any error.
    pub async fn transcribe_or_fallback(&self, audio_uri: &str) -> AudioAnalysis {
        match self.transcribe(audio_uri).await {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!("Transcription failed, using fallback: {err}");
                AudioAnalysis {
                    transcription: format!("Transcription failed: {err}"),
                    language_code: String::new(),
                }
            }
        }
    }
}
