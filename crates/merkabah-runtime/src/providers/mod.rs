//! Backend clients for merkabah-runtime.
//!
//! Every remote model is reached through the [`Backend`] trait. The one
//! production implementation, [`HttpBackend`], speaks three wire dialects:
//! OpenAI chat completions (also used by DeepSeek), Anthropic messages, and
//! Ollama generate.
//!
//! ## Security
//!
//! Credentials are carried as [`ApiCredential`] and only exposed when the
//! request header is built.

use async_trait::async_trait;
use merkabah_core::BackendId;
use std::time::Duration;
use thiserror::Error;

mod anthropic;
mod http;
mod ollama;
mod openai;
pub mod secrets;

pub use http::HttpBackend;
pub use secrets::{ApiCredential, CredentialSource};

/// Why a backend produced no text.
///
/// Each variant is local to one backend in one orchestration; none of them
/// aborts the fan-out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{backend}: no credential configured")]
    MissingCredential { backend: BackendId },

    #[error("{backend}: unreachable ({detail})")]
    Unreachable { backend: BackendId, detail: String },

    #[error("{backend}: remote error (HTTP {code})")]
    RemoteError { backend: BackendId, code: u16 },

    #[error("{backend}: malformed response ({detail})")]
    MalformedResponse { backend: BackendId, detail: String },
}

impl BackendError {
    /// Machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::MissingCredential { .. } => "missing_credential",
            BackendError::Unreachable { .. } => "unreachable",
            BackendError::RemoteError { .. } => "remote_error",
            BackendError::MalformedResponse { .. } => "malformed_response",
        }
    }

    pub fn backend(&self) -> BackendId {
        match self {
            BackendError::MissingCredential { backend }
            | BackendError::Unreachable { backend, .. }
            | BackendError::RemoteError { backend, .. }
            | BackendError::MalformedResponse { backend, .. } => *backend,
        }
    }
}

/// A remote model that turns a prompt into text.
///
/// The orchestrator holds backends as `Arc<dyn Backend>`, so tests can swap
/// in scripted implementations.
#[async_trait]
pub trait Backend: Send + Sync {
    fn id(&self) -> BackendId;

    /// Upper bound on one query. The orchestrator enforces it.
    fn timeout(&self) -> Duration;

    /// Send one prompt and return the generated text.
    async fn query(&self, prompt: &str) -> Result<String, BackendError>;
}
