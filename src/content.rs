//! Article generation.
//!
//! One request to the content model per run. The prompt pins the language,
//! the tone and the minimum depth of each section; the response schema pins
//! the shape (title, introduction, three sections, conclusion, three image
//! prompts). Neither is re-checked locally: a short section is the model's
//! problem, not a parse error. What *is* checked is that the response has
//! text at all and that the text is JSON of the requested shape.

use crate::backend::wire::GenerationConfig;
use crate::backend::{BackendError, GenerateRequest, GenerativeBackend};
use crate::types::GeneratedData;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("content request failed: {0}")]
    Backend(#[from] BackendError),
    #[error("the content model returned no text")]
    EmptyResponse,
    #[error("the content model returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// Instruction text for a topic.
pub fn content_prompt(topic: &str) -> String {
    format!(
        r#"You are an expert SEO content writer. Write a high-quality, substantial article in Simplified Chinese (简体中文) based on the keyword: "{topic}".

Requirements:
1. Content must be original, informative, and professional to ensure it is NOT flagged as spam or low-quality content.
2. Each section must be detailed (at least 200 words per section).
3. The tone should be authoritative yet accessible.
4. Strictly follow the JSON schema provided.
"#
    )
}

/// Response schema in the service's OpenAPI subset.
///
/// Field descriptions carry the cardinality and relevance constraints; the
/// service honours them as instructions rather than hard validation.
pub fn content_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "Optimization of the user title for article context (but user input title will be used for H1)."
            },
            "introduction": {
                "type": "STRING",
                "description": "A comprehensive and engaging introduction (100-150 words) in Simplified Chinese."
            },
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "heading": {
                            "type": "STRING",
                            "description": "Subheading for the section."
                        },
                        "content": {
                            "type": "STRING",
                            "description": "Detailed paragraph content (200+ words). Must be informative and high quality to avoid spam detection."
                        }
                    },
                    "required": ["heading", "content"]
                },
                "description": "Generate exactly 3 detailed sections for the article."
            },
            "conclusion": {
                "type": "STRING",
                "description": "A solid conclusion paragraph."
            },
            "imagePrompts": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Create exactly 3 distinct English prompts for AI image generation. CRITICAL: The prompts must be strictly describing the visual representation of the USER'S KEYWORD to ensure relevance. Do not deviate to abstract concepts."
            }
        },
        "required": ["title", "introduction", "sections", "conclusion", "imagePrompts"]
    })
}

/// Full request for a topic: prompt plus JSON response schema.
pub fn content_request(topic: &str) -> GenerateRequest {
    GenerateRequest::text(content_prompt(topic)).with_config(GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(content_schema()),
    })
}

/// Parse the model's JSON text into [`GeneratedData`].
pub fn parse_content(text: &str) -> Result<GeneratedData, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    serde_json::from_str(text).map_err(GenerationError::MalformedJson)
}

/// Ask the content model for an article about `topic`.
///
/// Failures are returned unmodified; there is no retry.
pub async fn generate_content(
    backend: &impl GenerativeBackend,
    model: &str,
    topic: &str,
) -> Result<GeneratedData, GenerationError> {
    info!(model, topic, "requesting article content");
    let response = backend.generate(model, &content_request(topic)).await?;
    let text = response.text().ok_or(GenerationError::EmptyResponse)?;
    debug!(bytes = text.len(), "content response received");
    parse_content(&text)
}
