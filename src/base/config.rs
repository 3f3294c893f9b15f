//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default OpenAI model used for image classification.
fn default_openai_classifier_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature for the classifier.
fn default_openai_classifier_temperature() -> f32 {
    0.0
}

/// Default max output tokens for the classifier.
fn default_openai_max_tokens() -> u32 {
    1024
}

/// Default prefix under which uploaded blobs are namespaced.
fn default_upload_prefix() -> String {
    "uploads".to_string()
}

/// Default signed-URL lifetime in seconds (15 minutes).
fn default_signed_url_expiry_secs() -> u64 {
    900
}

/// Default Speech-to-Text recognize endpoint.
fn default_speech_endpoint() -> String {
    "https://speech.googleapis.com/v1/speech:recognize".to_string()
}

/// Default Speech-to-Text recognition model.
fn default_speech_model() -> String {
    "latest_long".to_string()
}

/// Default primary language code for speech recognition.
fn default_speech_language_code() -> String {
    "en-US".to_string()
}

/// Default alternative language codes used for language detection.
fn default_speech_alternative_language_codes() -> Vec<String> {
    vec!["hi-IN".to_string(), "ta-IN".to_string(), "kn-IN".to_string()]
}

/// Default GCE metadata-server token URL.
fn default_metadata_token_url() -> String {
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".to_string()
}

/// Default database endpoint (in-memory engine).
fn default_db_endpoint() -> String {
    "memory".to_string()
}

/// Default number of tickets returned by the listing endpoint.
fn default_listing_limit() -> usize {
    20
}

/// Default HTTP listen address.
fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Configuration for the grievance-triage application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared inner configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The actual configuration values, shared behind [`Config`]'s `Arc`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI model used for image classification (`OPENAI_CLASSIFIER_MODEL`).
    #[serde(default = "default_openai_classifier_model")]
    pub openai_classifier_model: String,
    /// Sampling temperature for the classifier (`OPENAI_CLASSIFIER_TEMPERATURE`).
    /// Value between 0 and 2; low values keep category assignment deterministic.
    #[serde(default = "default_openai_classifier_temperature")]
    pub openai_classifier_temperature: f32,
    /// Max output tokens for the classifier (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Optional custom classifier prompt to override the default (`CLASSIFIER_PROMPT`).
    #[serde(default)]
    pub classifier_prompt: Option<String>,
    /// Storage bucket that receives client uploads (`STORAGE_BUCKET`).
    pub storage_bucket: String,
    /// Service account impersonated for URL signing (`SIGNING_SERVICE_ACCOUNT`).
    pub signing_service_account: String,
    /// Object-key prefix for client uploads (`UPLOAD_PREFIX`).
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
    /// Signed-URL lifetime in seconds (`SIGNED_URL_EXPIRY_SECS`).
    #[serde(default = "default_signed_url_expiry_secs")]
    pub signed_url_expiry_secs: u64,
    /// Speech-to-Text recognize endpoint (`SPEECH_ENDPOINT`).
    #[serde(default = "default_speech_endpoint")]
    pub speech_endpoint: String,
    /// Speech-to-Text recognition model (`SPEECH_MODEL`).
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Primary language code for speech recognition (`SPEECH_LANGUAGE_CODE`).
    #[serde(default = "default_speech_language_code")]
    pub speech_language_code: String,
    /// Alternative language codes for detection (`SPEECH_ALTERNATIVE_LANGUAGE_CODES`).
    #[serde(default = "default_speech_alternative_language_codes")]
    pub speech_alternative_language_codes: Vec<String>,
    /// Metadata-server token URL (`METADATA_TOKEN_URL`).
    #[serde(default = "default_metadata_token_url")]
    pub metadata_token_url: String,
    /// Optional static access token, used instead of the metadata server when
    /// set (`GCP_ACCESS_TOKEN`). Intended for local runs and tests.
    #[serde(default)]
    pub gcp_access_token: Option<String>,
    /// Database endpoint (`DB_ENDPOINT`): `memory`, or `ws://host:port`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`). Required for remote endpoints.
    #[serde(default)]
    pub db_username: String,
    /// Database password (`DB_PASSWORD`). Required for remote endpoints.
    #[serde(default)]
    pub db_password: String,
    /// Max tickets returned by the listing endpoint (`LISTING_LIMIT`).
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
    /// HTTP listen address (`LISTEN_ADDR`).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Config {
    /// Load configuration from the environment (prefix `GRIEVANCE`) and an
    /// optional TOML file, then validate ranges.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("GRIEVANCE"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.openai_classifier_temperature < 0.0 || result.openai_classifier_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI classifier temperature must be between 0 and 2."));
        }

        // GCS V4 signed URLs cap out at seven days.
        if result.signed_url_expiry_secs < 1 || result.signed_url_expiry_secs > 604_800 {
            return Err(anyhow::anyhow!("Signed URL expiry must be between 1 second and 7 days."));
        }

        if result.listing_limit < 1 {
            return Err(anyhow::anyhow!("Listing limit must be at least 1."));
        }

        Ok(result)
    }
}
