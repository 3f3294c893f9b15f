//! Image classification for grievance reports.
//!
//! The classifier assigns each submitted image one category from a fixed set
//! and a one-sentence description. Classification is best-effort by contract:
//! callers go through [`Classifier::classify_or_fallback`], which absorbs every
//! failure into a fixed degraded result so a classifier outage never blocks
//! ticket creation.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::warn;

use crate::base::types::{ImageAnalysis, Res};

pub mod openai;

// Traits.

/// Generic image classifier trait that clients must implement.
#[async_trait]
pub trait GenericClassifier: Send + Sync + 'static {
    /// Classify the image behind `image_uri` into a category and description.
    ///
    /// Implementations propagate their errors; the fallback policy lives on
    /// the [`Classifier`] wrapper, not here.
    async fn classify(&self, image_uri: &str) -> Res<ImageAnalysis>;
}

// Structs.

/// Classifier handle for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Classifier {
    inner: Arc<dyn GenericClassifier>,
}

impl Deref for Classifier {
    type Target = dyn GenericClassifier;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Classifier {
    pub fn new(inner: Arc<dyn GenericClassifier>) -> Self {
        Self { inner }
    }

    /// Classify, degrading to [`ImageAnalysis::fallback`] on any error.
    pub async fn classify_or_fallback(&self, image_uri: &str) -> ImageAnalysis {
        match self.classify(image_uri).await {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!("Image classification failed, using fallback: {err}");
                ImageAnalysis::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::types::Category;
    use anyhow::anyhow;

    struct FailingClassifier;

    #[async_trait]
    impl GenericClassifier for FailingClassifier {
        async fn classify(&self, _image_uri: &str) -> Res<ImageAnalysis> {
            Err(anyhow!("model unavailable"))
        }
    }

    struct FixedClassifier(ImageAnalysis);

    #[async_trait]
    impl GenericClassifier for FixedClassifier {
        async fn classify(&self, _image_uri: &str) -> Res<ImageAnalysis> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn errors_degrade_to_fallback() {
        let classifier = Classifier::new(Arc::new(FailingClassifier));
        let analysis = classifier.classify_or_fallback("gs://bucket/image.jpg").await;

        assert_eq!(analysis, ImageAnalysis::fallback());
    }

    #[tokio::test]
    async fn successful_analysis_passes_through() {
        let expected = ImageAnalysis {
            category: Category::Pothole,
            description: "A deep pothole in the road.".to_string(),
        };
        let classifier = Classifier::new(Arc::new(FixedClassifier(expected.clone())));

        let analysis = classifier.classify_or_fallback("gs://bucket/image.jpg").await;
        assert_eq!(analysis, expected);
    }
}
