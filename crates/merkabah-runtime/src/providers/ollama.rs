//! Ollama generate wire format.
//!
//! `POST /api/generate {model, prompt, stream: false}`, no auth, text at
//! `response`.

use serde::{Deserialize, Serialize};

/// Generate request body. Streaming is always off.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl GenerateRequest {
    pub(crate) fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        }
    }
}

pub(crate) fn extract_text(body: &[u8]) -> Result<String, String> {
    serde_json::from_slice::<GenerateResponse>(body)
        .map(|r| r.response)
        .map_err(|e| e.to_string())
}
