//! OpenAI-compatible chat completions wire format.
//!
//! Shared by OpenAI and DeepSeek: `POST {model, messages}` with a bearer
//! token, text at `choices[0].message.content`.

use serde::{Deserialize, Serialize};

/// Chat completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl ChatRequest {
    pub(crate) fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
        }
    }
}

/// Pull the first choice's text out of a response body.
pub(crate) fn extract_text(body: &[u8]) -> Result<String, String> {
    let response: ChatResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| "no choices in response".to_string())?
        .message
        .content
        .ok_or_else(|| "first choice has no content".to_string())
}
