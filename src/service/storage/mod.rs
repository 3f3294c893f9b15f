//! Blob store gateway: write-scoped upload URLs for client-supplied files.
//!
//! Clients never upload through this service; they request a pre-signed PUT
//! URL here and push the bytes directly to the blob store. The signing
//! mechanism itself is a pluggable capability behind [`GenericSigner`], with a
//! GCS V4 implementation in [`gcs`].

use std::{ops::Deref, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;

use crate::base::types::Res;

pub mod gcs;

// Traits.

/// Generic signing capability that implementations must satisfy.
///
/// Implementations hold whatever credentials or delegation machinery they
/// need; callers only ever see the bucket name and the resulting URL.
#[async_trait]
pub trait GenericSigner: Send + Sync + 'static {
    /// The bucket all signed URLs target.
    fn bucket(&self) -> &str;

    /// Produce a URL that permits exactly one operation: a PUT of the named
    /// object, valid for `expires_in` from now.
    async fn sign_put_url(&self, object: &str, expires_in: Duration) -> Res<String>;

    /// Produce a URL that permits a time-limited GET of the named object.
    ///
    /// Used to hand otherwise-private blobs to external services that can
    /// only fetch over https.
    async fn sign_get_url(&self, object: &str, expires_in: Duration) -> Res<String>;
}

// Structs.

/// Signer handle for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Signer {
    inner: Arc<dyn GenericSigner>,
}

impl Deref for Signer {
    type Target = dyn GenericSigner;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

/// An upload destination handed back to the client: the signed URL to PUT to,
/// and the `gs://` path under which the ingestion call should reference the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub signed_url: String,
    pub gs_path: String,
}

impl Signer {
    pub fn new(inner: Arc<dyn GenericSigner>) -> Self {
        Self { inner }
    }

    /// Plan a storage key for `filename` and sign a PUT URL for it.
    pub async fn upload_target(&self, prefix: &str, filename: &str, expires_in: Duration) -> Res<UploadTarget> {
        let object = unique_object_name(prefix, filename);
        let signed_url = self.sign_put_url(&object, expires_in).await?;
        let gs_path = format!("gs://{}/{}", self.bucket(), object);

        Ok(UploadTarget { signed_url, gs_path })
    }
}

/// Build a globally unique storage key for a client-named file.
///
/// The epoch-seconds prefix keeps concurrent clients uploading files with the
/// same name from colliding; the namespace prefix keeps client uploads apart
/// from anything else in the bucket.
pub fn unique_object_name(prefix: &str, filename: &str) -> String {
    format!("{}/{}-{}", prefix, Utc::now().timestamp(), filename)
}

/// Split a `gs://bucket/object` reference into its bucket and object key.
///
/// Returns `None` for anything that is not a `gs://` reference.
pub fn parse_gs_uri(uri: &str) -> Option<(&str, &str)> {
    uri.strip_prefix("gs://")?.split_once('/')
}
