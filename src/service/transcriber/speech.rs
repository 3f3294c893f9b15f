//! Google Cloud Speech-to-Text transcription over REST.
//!
//! Sends a `speech:recognize` request referencing the uploaded blob by URI,
//! with a long-form model and alternative language codes for detection, and
//! takes the top alternative of the first result.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{base::types::AudioAnalysis, prelude::*, service::auth::TokenSource};

use super::{GenericTranscriber, Transcriber};

// Extra methods on `Transcriber` applied by the speech implementation.

impl Transcriber {
    pub fn speech(config: &Config, token: TokenSource) -> Self {
        Self::new(Arc::new(SpeechTranscriber::new(config, token)))
    }
}

// Wire types for the recognize call.

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    model: String,
    language_code: String,
    alternative_language_codes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionAudio {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
    #[serde(default)]
    language_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

// Specific implementations.

/// Speech-to-Text transcriber implementation.
pub struct SpeechTranscriber {
    http: reqwest::Client,
    token: TokenSource,
    config: Config,
}

impl SpeechTranscriber {
    /// Create a new Speech-to-Text transcriber.
    pub fn new(config: &Config, token: TokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl GenericTranscriber for SpeechTranscriber {
    #[instrument(name = "SpeechTranscriber::transcribe", skip(self))]
    async fn transcribe(&self, audio_uri: &str) -> Res<AudioAnalysis> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                model: self.config.speech_model.clone(),
                language_code: self.config.speech_language_code.clone(),
                alternative_language_codes: self.config.speech_alternative_language_codes.clone(),
            },
            audio: RecognitionAudio { uri: audio_uri.to_string() },
        };

        let token = self.token.access_token().await?;

        let response: RecognizeResponse = self
            .http
            .post(&self.config.speech_endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let analysis = top_alternative(response);

        info!("Transcription yielded {} characters.", analysis.transcription.len());

        Ok(analysis)
    }
}

/// Reduce a recognize response to the top alternative of the first result.
fn top_alternative(response: RecognizeResponse) -> AudioAnalysis {
    let Some(result) = response.results.into_iter().next() else {
        return AudioAnalysis::default();
    };

    AudioAnalysis {
        transcription: result.alternatives.into_iter().next().map(|alt| alt.transcript).unwrap_or_default(),
        language_code: result.language_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_results_yield_empty_analysis() {
        let response: RecognizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(top_alternative(response), AudioAnalysis::default());
    }

    #[test]
    fn takes_top_alternative_of_first_result() {
        let response: RecognizeResponse = serde_json::from_str(
            r#"{
                "results": [
                    {
                        "alternatives": [
                            {"transcript": "the streetlight is broken", "confidence": 0.92},
                            {"transcript": "the streetlight has spoken", "confidence": 0.41}
                        ],
                        "languageCode": "en-us"
                    },
                    {
                        "alternatives": [{"transcript": "ignored second result"}],
                        "languageCode": "en-us"
                    }
                ]
            }"#,
        )
        .unwrap();

        let analysis = top_alternative(response);
        assert_eq!(analysis.transcription, "the streetlight is broken");
        assert_eq!(analysis.language_code, "en-us");
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                model: "latest_long".to_string(),
                language_code: "en-US".to_string(),
                alternative_language_codes: vec!["hi-IN".to_string()],
            },
            audio: RecognitionAudio { uri: "gs://bucket/audio.webm".to_string() },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["config"]["languageCode"], "en-US");
        assert_eq!(json["config"]["alternativeLanguageCodes"][0], "hi-IN");
        assert_eq!(json["audio"]["uri"], "gs://bucket/audio.webm");
    }
}
