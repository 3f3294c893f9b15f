//! GCS V4 signed URLs via IAM credential delegation.
//!
//! The signature is produced by the IAM Credentials `signBlob` API under the
//! configured service account, so the actual signing key never resides in this
//! process. The rest of this module is the V4 canonicalization: canonical
//! request, string-to-sign, and the final query-string assembly.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{prelude::*, service::auth::TokenSource};

use super::{GenericSigner, Signer};

const STORAGE_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";

/// V4 unreserved characters; everything else is percent-encoded.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Path segments keep their separators.
const PATH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b'/');

// Extra methods on `Signer` applied by the GCS implementation.

impl Signer {
    pub fn gcs(config: &Config, token: TokenSource) -> Self {
        Self::new(Arc::new(GcsSigner::new(config, token)))
    }
}

// Specific implementations.

/// GCS signer backed by IAM `signBlob` delegation.
pub struct GcsSigner {
    http: reqwest::Client,
    token: TokenSource,
    bucket: String,
    service_account: String,
}

#[derive(Serialize)]
struct SignBlobRequest {
    payload: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignBlobResponse {
    signed_blob: String,
}

impl GcsSigner {
    pub fn new(config: &Config, token: TokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            bucket: config.storage_bucket.clone(),
            service_account: config.signing_service_account.clone(),
        }
    }

    /// Sign raw bytes with the delegated service account key.
    #[instrument(name = "GcsSigner::sign_blob", skip_all)]
    async fn sign_blob(&self, payload: &[u8]) -> Res<Vec<u8>> {
        let url = format!(
            "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/{}:signBlob",
            self.service_account
        );

        let token = self.token.access_token().await?;

        let response: SignBlobResponse = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&SignBlobRequest { payload: BASE64.encode(payload) })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(BASE64.decode(response.signed_blob)?)
    }

    /// Assemble and sign a V4 URL for a single `method` on `object`.
    async fn sign_url(&self, method: &str, object: &str, expires_in: Duration) -> Res<String> {
        let now = Utc::now();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let scope = format!("{date}/auto/storage/goog4_request");
        let credential = format!("{}/{}", self.service_account, scope);

        let query = canonical_query(&credential, &timestamp, expires_in.as_secs());
        let path = canonical_path(&self.bucket, object);
        let request = canonical_request(method, &path, &query);
        let to_sign = string_to_sign(&timestamp, &scope, &request);

        let signature = self.sign_blob(to_sign.as_bytes()).await?;

        Ok(format!("https://{STORAGE_HOST}{path}?{query}&X-Goog-Signature={}", hex(&signature)))
    }
}

#[async_trait]
impl GenericSigner for GcsSigner {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(name = "GcsSigner::sign_put_url", skip(self))]
    async fn sign_put_url(&self, object: &str, expires_in: Duration) -> Res<String> {
        self.sign_url("PUT", object, expires_in).await
    }

    #[instrument(name = "GcsSigner::sign_get_url", skip(self))]
    async fn sign_get_url(&self, object: &str, expires_in: Duration) -> Res<String> {
        self.sign_url("GET", object, expires_in).await
    }
}

// V4 canonicalization helpers.

/// Canonical query string: keys already in sorted order, values encoded.
fn canonical_query(credential: &str, timestamp: &str, expires_secs: u64) -> String {
    format!(
        "X-Goog-Algorithm={SIGNING_ALGORITHM}\
         &X-Goog-Credential={}\
         &X-Goog-Date={timestamp}\
         &X-Goog-Expires={expires_secs}\
         &X-Goog-SignedHeaders=host",
        utf8_percent_encode(credential, QUERY_ENCODE),
    )
}

/// Canonical resource path for a bucket-scoped object.
fn canonical_path(bucket: &str, object: &str) -> String {
    format!("/{bucket}/{}", utf8_percent_encode(object, PATH_ENCODE))
}

/// Canonical request with only the `host` header signed and an unsigned payload.
fn canonical_request(method: &str, path: &str, query: &str) -> String {
    format!("{method}\n{path}\n{query}\nhost:{STORAGE_HOST}\n\nhost\nUNSIGNED-PAYLOAD")
}

/// The string actually signed: algorithm, timestamp, scope, and the hashed
/// canonical request.
fn string_to_sign(timestamp: &str, scope: &str, canonical_request: &str) -> String {
    let hash = hex(&Sha256::digest(canonical_request.as_bytes()));

    format!("{SIGNING_ALGORITHM}\n{timestamp}\n{scope}\n{hash}")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
