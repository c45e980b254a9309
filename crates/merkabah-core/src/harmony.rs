//! Harmony scoring for individual messages.
//!
//! A harmony score is a heuristic content-quality metric in `[0.0, 1.0]`.
//! Four sub-scores are normalized against fixed targets and averaged with
//! equal weight:
//!
//! | component   | normalization                                   |
//! |-------------|-------------------------------------------------|
//! | length      | `min(1, chars / 200)`                           |
//! | words       | `min(1, words / 50)`                            |
//! | sentiment   | `clamp(0.5 + (positive - negative) / 10, 0, 1)` |
//! | punctuation | `min(1, count of ".,!?;:" / 5)`                 |
//!
//! Scoring is pure: the same text always produces the same score.

use serde::{Deserialize, Serialize};

/// Character count at which the length component saturates.
pub const TARGET_CHARS: f64 = 200.0;

/// Word count at which the word component saturates.
pub const TARGET_WORDS: f64 = 50.0;

/// Weight applied to each of the four components.
pub const COMPONENT_WEIGHT: f64 = 0.25;

/// Words that pull the sentiment component up.
pub const POSITIVE_WORDS: [&str; 7] = ["good", "great", "love", "happy", "yes", "thanks", "please"];

/// Words that pull the sentiment component down.
pub const NEGATIVE_WORDS: [&str; 7] = ["bad", "hate", "angry", "sad", "no", "never", "sorry"];

const PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Per-component view of a harmony score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonyBreakdown {
    pub length: f64,
    pub words: f64,
    pub sentiment: f64,
    pub punctuation: f64,
}

impl HarmonyBreakdown {
    /// Compute every component for `text`.
    pub fn of(text: &str) -> Self {
        let lowered = text.to_lowercase();

        let length = (text.chars().count() as f64 / TARGET_CHARS).min(1.0);
        let words = (text.split_whitespace().count() as f64 / TARGET_WORDS).min(1.0);

        // Substring membership, each lexicon word counted once.
        let positive = lexicon_hits(&lowered, &POSITIVE_WORDS);
        let negative = lexicon_hits(&lowered, &NEGATIVE_WORDS);
        let sentiment = (0.5 + (positive as f64 - negative as f64) / 10.0).clamp(0.0, 1.0);

        let marks = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
        let punctuation = (marks as f64 / 5.0).min(1.0);

        Self {
            length,
            words,
            sentiment,
            punctuation,
        }
    }

    /// Weighted total, rounded to 3 decimals.
    ///
    /// Each component is weighted before summing, left to right, so the
    /// unrounded total is bit-for-bit stable.
    pub fn total(&self) -> f64 {
        round3(
            self.length * COMPONENT_WEIGHT
                + self.words * COMPONENT_WEIGHT
                + self.sentiment * COMPONENT_WEIGHT
                + self.punctuation * COMPONENT_WEIGHT,
        )
    }
}

/// Score a piece of text.
///
/// Total over all inputs: the empty string scores `0.125` (the sentiment
/// midpoint alone).
pub fn score(text: &str) -> f64 {
    HarmonyBreakdown::of(text).total()
}

fn lexicon_hits(lowered: &str, lexicon: &[&str]) -> usize {
    lexicon.iter().filter(|word| lowered.contains(*word)).count()
}

/// Round to 3 decimal places.
///
/// Rounds the exact binary value: `0.1475` is stored just below the midpoint
/// and becomes `0.147`. Scaling by 1000 first would round it up.
pub fn round3(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(value)
}
