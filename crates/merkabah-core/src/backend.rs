//! Identifiers for the remote generation backends.
//!
//! The set is closed: every backend the toolkit can reach is a variant here.
//! Wire-level details (endpoints, auth headers, response shapes) live in
//! `merkabah-runtime`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A remote language-model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages
    Anthropic,
    /// Locally hosted Ollama server
    Ollama,
    /// DeepSeek (OpenAI-compatible)
    DeepSeek,
}

impl BackendId {
    /// Every backend, in report order.
    pub const ALL: [BackendId; 4] = [
        BackendId::OpenAi,
        BackendId::Anthropic,
        BackendId::Ollama,
        BackendId::DeepSeek,
    ];

    /// Stable lower-case name used on the wire and in config files.
    pub fn name(self) -> &'static str {
        match self {
            BackendId::OpenAi => "openai",
            BackendId::Anthropic => "anthropic",
            BackendId::Ollama => "ollama",
            BackendId::DeepSeek => "deepseek",
        }
    }

    /// Role label shown in synthesis reports.
    pub fn role(self) -> &'static str {
        match self {
            BackendId::OpenAi => "Witness",
            BackendId::Anthropic => "Judge",
            BackendId::Ollama => "Servant",
            BackendId::DeepSeek => "Seer",
        }
    }

    /// Whether the backend is hosted on this machine.
    pub fn is_local(self) -> bool {
        matches!(self, BackendId::Ollama)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized backend name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown backend '{0}'. Available: openai, anthropic, ollama, deepseek")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendId {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<BackendId>().unwrap(), BackendId::OpenAi);
        assert_eq!(" deepseek ".parse::<BackendId>().unwrap(), BackendId::DeepSeek);
        assert!("gemini".parse::<BackendId>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&BackendId::DeepSeek).unwrap();
        assert_eq!(json, "\"deepseek\"");
        let back: BackendId = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(back, BackendId::Ollama);
    }

    #[test]
    fn test_only_ollama_is_local() {
        let local: Vec<_> = BackendId::ALL.into_iter().filter(|id| id.is_local()).collect();
        assert_eq!(local, vec![BackendId::Ollama]);
    }
}
