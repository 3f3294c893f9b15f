//! Access-token acquisition for Google Cloud API calls.
//!
//! The signer and the transcriber both authenticate with short-lived bearer
//! tokens. On Google infrastructure these come from the instance metadata
//! server; for local runs and tests a static token can be supplied instead.

use std::{
    ops::Deref,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::prelude::*;

// Traits.

/// Generic token source trait that implementations must satisfy.
#[async_trait]
pub trait GenericTokenSource: Send + Sync + 'static {
    /// Get a currently valid OAuth2 access token.
    async fn access_token(&self) -> Res<String>;
}

// Structs.

/// Token source handle for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TokenSource {
    inner: Arc<dyn GenericTokenSource>,
}

impl Deref for TokenSource {
    type Target = dyn GenericTokenSource;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TokenSource {
    pub fn new(inner: Arc<dyn GenericTokenSource>) -> Self {
        Self { inner }
    }

    /// Pick the token source implied by the config: a static token when one is
    /// configured, the metadata server otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.gcp_access_token {
            Some(token) => Self::new(Arc::new(StaticTokenSource::new(token))),
            None => Self::new(Arc::new(MetadataTokenSource::new(config))),
        }
    }
}

/// A fixed token, handed out as-is.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: &str) -> Self {
        Self { token: token.to_string() }
    }
}

#[async_trait]
impl GenericTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Res<String> {
        Ok(self.token.clone())
    }
}

/// Token source backed by the GCE metadata server.
///
/// Tokens are cached and refreshed one minute before expiry; concurrent
/// requests share the cached token through the read lock.
pub struct MetadataTokenSource {
    http: reqwest::Client,
    token_url: String,
    cached: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

impl MetadataTokenSource {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: config.metadata_token_url.clone(),
            cached: RwLock::new(None),
        }
    }
}

#[async_trait]
impl GenericTokenSource for MetadataTokenSource {
    #[instrument(name = "MetadataTokenSource::access_token", skip_all)]
    async fn access_token(&self) -> Res<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        debug!("Fetching fresh access token from metadata server ...");

        let response: MetadataTokenResponse = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let expires_at = Instant::now() + Duration::from_secs(response.expires_in.saturating_sub(60));

        *self.cached.write().await = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at,
        });

        Ok(response.access_token)
    }
}
