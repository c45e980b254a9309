//! Tier classification and message routing.
//!
//! A harmony score maps to exactly one of four tiers. Thresholds are strict
//! greater-than comparisons, checked from the highest band down:
//!
//! | score        | tier    | backend   |
//! |--------------|---------|-----------|
//! | > 0.8        | ARCHIVE | deepseek  |
//! | (0.6, 0.8]   | VERIFY  | anthropic |
//! | (0.4, 0.6]   | PROCESS | ollama    |
//! | <= 0.4       | REVIEW  | openai    |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendId;
use crate::harmony;

/// Handling tier, ordered by ascending quality threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Review,
    Process,
    Verify,
    Archive,
}

impl Tier {
    /// All tiers, lowest first.
    pub const ALL: [Tier; 4] = [Tier::Review, Tier::Process, Tier::Verify, Tier::Archive];

    /// Exclusive lower bound of the tier's band. `None` for REVIEW.
    pub fn lower_bound(self) -> Option<f64> {
        match self {
            Tier::Review => None,
            Tier::Process => Some(0.4),
            Tier::Verify => Some(0.6),
            Tier::Archive => Some(0.8),
        }
    }

    /// Suggested handling for messages in this tier.
    pub fn action(self) -> &'static str {
        match self {
            Tier::Review => "flag for manual review",
            Tier::Process => "standard handling",
            Tier::Verify => "flag for confirmation",
            Tier::Archive => "store as high-value",
        }
    }

    /// Backend that handles messages in this tier.
    pub fn assigned_backend(self) -> BackendId {
        match self {
            Tier::Review => BackendId::OpenAi,
            Tier::Process => BackendId::Ollama,
            Tier::Verify => BackendId::Anthropic,
            Tier::Archive => BackendId::DeepSeek,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Review => "REVIEW",
            Tier::Process => "PROCESS",
            Tier::Verify => "VERIFY",
            Tier::Archive => "ARCHIVE",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a harmony score. NaN falls through to REVIEW.
pub fn classify(score: f64) -> Tier {
    Tier::ALL
        .into_iter()
        .rev()
        .find(|tier| tier.lower_bound().map_or(true, |bound| score > bound))
        .unwrap_or(Tier::Review)
}

/// Routing outcome for a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub message: String,
    pub harmony_score: f64,
    pub tier: Tier,
    pub action: String,
    pub assigned_backend: BackendId,
    pub timestamp: DateTime<Utc>,
}

/// Score, classify and route a message.
pub fn route(message: &str) -> RoutingDecision {
    let harmony_score = harmony::score(message);
    let tier = classify(harmony_score);

    tracing::debug!(score = harmony_score, tier = %tier, "Routed message");

    RoutingDecision {
        message: message.to_string(),
        harmony_score,
        tier,
        action: tier.action().to_string(),
        assigned_backend: tier.assigned_backend(),
        timestamp: Utc::now(),
    }
}
