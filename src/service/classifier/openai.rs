//! OpenAI-backed image classification.
//!
//! One chat-completion request pairs the image reference with the fixed
//! instruction prompt, with the model output constrained to a JSON schema
//! carrying exactly the category enum and a description string.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessageContentPartImageArgs, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;

use crate::{
    base::{prompts, types::ImageAnalysis},
    prelude::*,
    service::storage::{Signer, parse_gs_uri},
};

use super::{Classifier, GenericClassifier};

// Extra methods on `Classifier` applied by the openai implementation.

impl Classifier {
    pub fn openai(config: &Config, signer: Signer) -> Self {
        Self::new(Arc::new(OpenAiClassifier::new(config, signer)))
    }
}

// Specific implementations.

/// OpenAI classifier implementation.
#[derive(Clone)]
pub struct OpenAiClassifier {
    client: Client<OpenAIConfig>,
    config: Config,
    signer: Signer,
}

impl OpenAiClassifier {
    /// Create a new OpenAI classifier.
    #[instrument(name = "OpenAiClassifier::new", skip_all)]
    pub fn new(config: &Config, signer: Signer) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
            signer,
        }
    }

    /// Resolve `image_uri` into a URL the model host can actually fetch.
    ///
    /// `gs://` references point into our private bucket, so they are exchanged
    /// for a short-lived signed GET URL; anything else is assumed to be
    /// publicly reachable and passes through untouched.
    async fn readable_image_url(&self, image_uri: &str) -> Res<String> {
        let Some((bucket, object)) = parse_gs_uri(image_uri) else {
            return Ok(image_uri.to_string());
        };

        if bucket != self.signer.bucket() {
            return Err(anyhow!("Image {image_uri} is not in bucket {}.", self.signer.bucket()));
        }

        self.signer.sign_get_url(object, Duration::from_secs(self.config.signed_url_expiry_secs)).await
    }
}

#[async_trait]
impl GenericClassifier for OpenAiClassifier {
    #[instrument(name = "OpenAiClassifier::classify", skip(self))]
    async fn classify(&self, image_uri: &str) -> Res<ImageAnalysis> {
        let image_url = self.readable_image_url(image_uri).await?;

        let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(ImageUrlArgs::default().url(image_url).detail(ImageDetail::Auto).build()?)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_classifier_model)
            .temperature(self.config.openai_classifier_temperature)
            .max_completion_tokens(self.config.openai_max_tokens)
            .response_format(analysis_response_format())
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompts::get_classifier_prompt(&self.config))
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default().content(vec![image_part.into()]).build()?.into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| anyhow!("Classifier returned no content."))?;

        let analysis = parse_analysis(content)?;

        info!("Image classified as {:?}.", analysis.category);

        Ok(analysis)
    }
}

/// Parse the structured model output into an analysis.
fn parse_analysis(content: &str) -> Res<ImageAnalysis> {
    Ok(serde_json::from_str(content)?)
}

/// JSON-schema response format mirroring [`ImageAnalysis`].
fn analysis_response_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            name: "grievance_image_analysis".to_string(),
            description: Some("Category and one-sentence description for a grievance image.".to_string()),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["Pothole", "Garbage Dump", "Broken Streetlight", "Fallen Tree", "Flooding", "Other"]
                    },
                    "description": { "type": "string" }
                },
                "required": ["category", "description"],
                "additionalProperties": false
            })),
            strict: Some(true),
        },
    }
}
