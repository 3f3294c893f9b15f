//! Prompt templates for the image classifier.

use crate::base::config::Config;

/// Instruction prompt sent alongside every grievance image.
///
/// The category list here must stay in sync with [`crate::base::types::Category`]:
/// the model is constrained to this exact set by the structured-output schema,
/// and the parser rejects anything outside it.
pub const CLASSIFIER_PROMPT: &str = r#"
Analyze this image from a public grievance report.
Categorize it into one of: 'Pothole', 'Garbage Dump', 'Broken Streetlight', 'Fallen Tree', 'Flooding', 'Other'.
Provide a one-sentence description of the problem.
Return your response as a JSON object with "category" and "description" keys.
"#;

/// Get the classifier prompt, using the config override if provided.
pub fn get_classifier_prompt(config: &Config) -> &str {
    if let Some(custom_prompt) = &config.classifier_prompt { custom_prompt } else { CLASSIFIER_PROMPT }
}
