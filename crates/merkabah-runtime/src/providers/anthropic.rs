//! Anthropic messages wire format.
//!
//! `POST /v1/messages` with `x-api-key` and a pinned `anthropic-version`
//! header. Text is the concatenation of the response's text blocks.

use serde::{Deserialize, Serialize};

/// API version sent with every request.
pub(crate) const API_VERSION: &str = "2023-06-01";

/// Output token ceiling for a single query.
pub(crate) const MAX_TOKENS: u32 = 1024;

/// Anthropic API request format.
#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

/// Anthropic API response format.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockResponse {
    #[serde(rename = "type")]
    #[allow(dead_code)] // Required for deserialization, not read directly
    type_: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl MessagesRequest {
    pub(crate) fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: vec![ContentBlock::Text {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

pub(crate) fn extract_text(body: &[u8]) -> Result<String, String> {
    let response: MessagesResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect();

    if texts.is_empty() {
        return Err("no text blocks in response".to_string());
    }
    Ok(texts.join(""))
}

/// Error message from a non-success body, if it has the documented shape.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<AnthropicError>(body)
        .ok()
        .map(|e| e.error.message)
}
