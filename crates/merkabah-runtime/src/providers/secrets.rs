//! Secure credential handling for backends.
//!
//! Every backend credential is held in an [`ApiCredential`]:
//!
//! - **No accidental logging**: the value never appears in `Debug`/`Display`
//! - **Zeroed on drop** via `secrecy`
//! - **Explicit exposure**: callers must call `.expose()` at the point of use
//!
//! Credentials are resolved once, when configuration is turned into backend
//! descriptors. Clients never read the environment themselves.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the configuration file
    Config,
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a raw value. It cannot be logged after this point.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Resolve a credential from an explicit value, falling back to an
    /// environment variable looked up through `lookup`.
    ///
    /// Empty values count as absent. Returns `None` when neither source
    /// yields a value; absence is a per-backend condition, not an error.
    pub fn resolve<F>(
        explicit: Option<&str>,
        env_var: Option<&str>,
        lookup: F,
        name: &'static str,
    ) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = explicit.filter(|v| !v.is_empty()) {
            return Some(Self::new(value, CredentialSource::Config, name));
        }

        env_var
            .and_then(lookup)
            .filter(|v| !v.is_empty())
            .map(|v| Self::new(v, CredentialSource::Environment, name))
    }

    /// Expose the credential value for use in a request header.
    ///
    /// Only call this where the value is actually sent. Never store it.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Clone for ApiCredential {
    fn clone(&self) -> Self {
        Self::new(self.expose(), self.source, self.name)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
