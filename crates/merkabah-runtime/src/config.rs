//! Orchestrator configuration.
//!
//! Configuration is explicit: a YAML file (or defaults) describes each
//! backend, and [`OrchestratorConfig::resolve`] turns it into
//! [`BackendDescriptor`]s with credentials attached. The orchestrator only
//! ever sees descriptors.
//!
//! ```yaml
//! backends:
//!   openai:
//!     model: gpt-4o
//!     timeout: 20s
//!   ollama:
//!     endpoint: http://gpu-box:11434/api/generate
//!     timeout: 2m
//!   deepseek:
//!     enabled: false
//! ```

use merkabah_core::BackendId;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::ApiCredential;

/// Hosted API calls give up after this long.
pub const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);

/// A local model is slower; it gets twice as long.
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid endpoint for {backend}: '{endpoint}' must start with http:// or https://")]
    InvalidEndpoint { backend: BackendId, endpoint: String },

    #[error("Invalid timeout for {backend}: must be greater than zero")]
    InvalidTimeout { backend: BackendId },
}

/// Fixed per-backend defaults.
pub fn default_endpoint(id: BackendId) -> &'static str {
    match id {
        BackendId::OpenAi => "https://api.openai.com/v1/chat/completions",
        BackendId::Anthropic => "https://api.anthropic.com/v1/messages",
        BackendId::Ollama => "http://localhost:11434/api/generate",
        BackendId::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
    }
}

pub fn default_model(id: BackendId) -> &'static str {
    match id {
        BackendId::OpenAi => "gpt-4",
        BackendId::Anthropic => "claude-3-sonnet",
        BackendId::Ollama => "mistral",
        BackendId::DeepSeek => "deepseek-chat",
    }
}

/// Environment variable holding the backend's key. `None` for backends that
/// need no credential.
pub fn default_credential_env(id: BackendId) -> Option<&'static str> {
    match id {
        BackendId::OpenAi => Some("OPENAI_API_KEY"),
        BackendId::Anthropic => Some("ANTHROPIC_API_KEY"),
        BackendId::Ollama => None,
        BackendId::DeepSeek => Some("DEEPSEEK_API_KEY"),
    }
}

pub fn default_timeout(id: BackendId) -> Duration {
    if id.is_local() {
        LOCAL_TIMEOUT
    } else {
        HOSTED_TIMEOUT
    }
}

fn credential_name(id: BackendId) -> &'static str {
    match id {
        BackendId::OpenAi => "OpenAI API key",
        BackendId::Anthropic => "Anthropic API key",
        BackendId::Ollama => "Ollama API key",
        BackendId::DeepSeek => "DeepSeek API key",
    }
}

/// Everything needed to reach one backend.
#[derive(Debug, Clone)]
pub struct BackendDescriptor {
    pub id: BackendId,
    pub endpoint: String,
    pub model: String,
    pub credential: Option<ApiCredential>,
    pub timeout: Duration,
}

impl BackendDescriptor {
    /// Defaults for `id`, without a credential.
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            endpoint: default_endpoint(id).to_string(),
            model: default_model(id).to_string(),
            credential: None,
            timeout: default_timeout(id),
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a request may be sent without a credential.
    pub fn requires_credential(&self) -> bool {
        default_credential_env(self.id).is_some()
    }
}

/// Settings for one backend as written in the config file.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSettings {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Inline key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable to read the key from
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default, deserialize_with = "humantime_opt")]
    pub timeout: Option<Duration>,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            model: None,
            api_key: None,
            api_key_env: None,
            timeout: None,
        }
    }
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_env", &self.api_key_env)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn humantime_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Configuration for the whole orchestrator.
///
/// Backends absent from the file keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub backends: BTreeMap<BackendId, BackendSettings>,
}

impl OrchestratorConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: OrchestratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (&backend, settings) in &self.backends {
            if let Some(endpoint) = &settings.endpoint {
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(ConfigError::InvalidEndpoint {
                        backend,
                        endpoint: endpoint.clone(),
                    });
                }
            }
            if settings.timeout == Some(Duration::ZERO) {
                return Err(ConfigError::InvalidTimeout { backend });
            }
        }
        Ok(())
    }

    /// Settings for `id`, falling back to defaults.
    pub fn settings(&self, id: BackendId) -> BackendSettings {
        self.backends.get(&id).cloned().unwrap_or_default()
    }

    /// Build descriptors for every enabled backend, looking credentials up
    /// through `lookup` when the file does not carry them inline.
    pub fn resolve<F>(&self, lookup: F) -> Vec<BackendDescriptor>
    where
        F: Fn(&str) -> Option<String>,
    {
        BackendId::ALL
            .into_iter()
            .filter_map(|id| {
                let settings = self.settings(id);
                if !settings.enabled {
                    tracing::debug!(backend = %id, "Backend disabled by config");
                    return None;
                }

                let env_var = settings
                    .api_key_env
                    .as_deref()
                    .or_else(|| default_credential_env(id));
                let credential = ApiCredential::resolve(
                    settings.api_key.as_deref(),
                    env_var,
                    &lookup,
                    credential_name(id),
                );

                if credential.is_none() && default_credential_env(id).is_some() {
                    tracing::debug!(backend = %id, env = ?env_var, "No credential configured");
                }

                let mut descriptor = BackendDescriptor::new(id);
                descriptor.credential = credential;
                if let Some(endpoint) = settings.endpoint {
                    descriptor.endpoint = endpoint;
                }
                if let Some(model) = settings.model {
                    descriptor.model = model;
                }
                if let Some(timeout) = settings.timeout {
                    descriptor.timeout = timeout;
                }
                Some(descriptor)
            })
            .collect()
    }

    /// [`resolve`](Self::resolve) against the process environment.
    pub fn resolve_from_env(&self) -> Vec<BackendDescriptor> {
        self.resolve(|var| std::env::var(var).ok())
    }
}
