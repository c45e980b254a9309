//! HTTP client shared by every backend.
//!
//! The backend id picks the wire dialect; the descriptor supplies endpoint,
//! model, credential and timeout. One request per query, no retries.

use async_trait::async_trait;
use merkabah_core::BackendId;
use std::time::Duration;

use super::{anthropic, ollama, openai, Backend, BackendError};
use crate::config::BackendDescriptor;

/// A backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    descriptor: BackendDescriptor,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(descriptor: BackendDescriptor) -> Self {
        Self::with_client(descriptor, reqwest::Client::new())
    }

    /// Share a connection pool between backends.
    pub fn with_client(descriptor: BackendDescriptor, client: reqwest::Client) -> Self {
        Self { descriptor, client }
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn request(&self, prompt: &str) -> Result<reqwest::RequestBuilder, BackendError> {
        let id = self.descriptor.id;
        let model = self.descriptor.model.as_str();
        let credential = self.descriptor.credential.as_ref().filter(|c| !c.is_empty());

        if credential.is_none() && self.descriptor.requires_credential() {
            return Err(BackendError::MissingCredential { backend: id });
        }

        let builder = self
            .client
            .post(&self.descriptor.endpoint)
            .header("content-type", "application/json")
            .timeout(self.descriptor.timeout);

        // SECURITY: the credential is only exposed here, at the point of use
        let builder = match id {
            BackendId::OpenAi | BackendId::DeepSeek => builder
                .bearer_auth(credential.map(|c| c.expose()).unwrap_or_default())
                .json(&openai::ChatRequest::new(model, prompt)),
            BackendId::Anthropic => builder
                .header("x-api-key", credential.map(|c| c.expose()).unwrap_or_default())
                .header("anthropic-version", anthropic::API_VERSION)
                .json(&anthropic::MessagesRequest::new(model, prompt)),
            BackendId::Ollama => {
                let builder = match credential {
                    Some(c) => builder.bearer_auth(c.expose()),
                    None => builder,
                };
                builder.json(&ollama::GenerateRequest::new(model, prompt))
            }
        };
        Ok(builder)
    }

    /// Transport failure while sending or while reading the body.
    fn unreachable(&self, error: reqwest::Error) -> BackendError {
        let detail = if error.is_timeout() {
            format!("timed out after {:?}", self.descriptor.timeout)
        } else {
            error.to_string()
        };
        BackendError::Unreachable {
            backend: self.descriptor.id,
            detail,
        }
    }

    fn extract(&self, body: &[u8]) -> Result<String, String> {
        match self.descriptor.id {
            BackendId::OpenAi | BackendId::DeepSeek => openai::extract_text(body),
            BackendId::Anthropic => anthropic::extract_text(body),
            BackendId::Ollama => ollama::extract_text(body),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn id(&self) -> BackendId {
        self.descriptor.id
    }

    fn timeout(&self) -> Duration {
        self.descriptor.timeout
    }

    async fn query(&self, prompt: &str) -> Result<String, BackendError> {
        let backend = self.descriptor.id;
        let request = self.request(prompt)?;

        let response = request.send().await.map_err(|e| self.unreachable(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.unreachable(e))?;

        if !status.is_success() {
            if backend == BackendId::Anthropic {
                if let Some(message) = anthropic::error_message(&body) {
                    tracing::debug!(%backend, code = status.as_u16(), %message, "Remote error");
                }
            }
            return Err(BackendError::RemoteError {
                backend,
                code: status.as_u16(),
            });
        }

        self.extract(&body)
            .map_err(|detail| BackendError::MalformedResponse { backend, detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ApiCredential, CredentialSource};

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        // Port 9 would refuse the connection; MissingCredential comes first.
        let descriptor = BackendDescriptor::new(BackendId::OpenAi).with_endpoint("http://127.0.0.1:9/");
        let backend = HttpBackend::new(descriptor);

        assert_eq!(
            backend.query("hello").await,
            Err(BackendError::MissingCredential { backend: BackendId::OpenAi })
        );
    }

    #[tokio::test]
    async fn test_empty_credential_counts_as_missing() {
        let descriptor = BackendDescriptor::new(BackendId::Anthropic)
            .with_endpoint("http://127.0.0.1:9/")
            .with_credential(ApiCredential::new("", CredentialSource::Programmatic, "test"));

        assert!(matches!(
            HttpBackend::new(descriptor).query("hello").await,
            Err(BackendError::MissingCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let descriptor = BackendDescriptor::new(BackendId::Ollama)
            .with_endpoint("http://127.0.0.1:9/api/generate")
            .with_timeout(Duration::from_secs(5));
        let backend = HttpBackend::new(descriptor);

        assert_eq!(backend.id(), BackendId::Ollama);
        assert_eq!(backend.timeout(), Duration::from_secs(5));
        assert!(matches!(
            backend.query("hello").await,
            Err(BackendError::Unreachable { backend: BackendId::Ollama, .. })
        ));
    }

    #[test]
    fn test_dialect_follows_backend() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        let deepseek = HttpBackend::new(BackendDescriptor::new(BackendId::DeepSeek));
        assert_eq!(deepseek.extract(body).unwrap(), "hi");

        let ollama = HttpBackend::new(BackendDescriptor::new(BackendId::Ollama));
        assert!(ollama.extract(body).is_err());
        assert_eq!(ollama.extract(br#"{"response":"yo"}"#).unwrap(), "yo");
    }
}
