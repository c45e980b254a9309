//! Batch analysis over ingested messages.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::parser::{IngestError, Message};
use crate::harmony::{self, round3};

/// Aggregate statistics for a batch of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub total_messages: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub average_message_length: f64,

    /// Distinct senders, sorted
    pub senders: Vec<String>,

    pub average_harmony: f64,
    pub min_harmony: f64,
    pub max_harmony: f64,
}

/// Harmony score per message timestamp.
///
/// Messages sharing a timestamp collapse to the last one seen.
pub fn harmony_by_timestamp(messages: &[Message]) -> BTreeMap<String, f64> {
    messages
        .iter()
        .map(|m| (m.timestamp.clone(), harmony::score(&m.body)))
        .collect()
}

/// Analyze a batch. Harmony aggregates run over every message body.
pub fn analyze(messages: &[Message]) -> Result<BatchAnalysis, IngestError> {
    if messages.is_empty() {
        return Err(IngestError::NoMessages);
    }

    let total_messages = messages.len();
    let total_characters: usize = messages.iter().map(|m| m.length).sum();
    let total_words: usize = messages.iter().map(|m| m.word_count).sum();

    let scores: Vec<f64> = messages.iter().map(|m| harmony::score(&m.body)).collect();
    let sum: f64 = scores.iter().sum();
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let senders: BTreeSet<&str> = messages.iter().map(|m| m.sender.as_str()).collect();

    Ok(BatchAnalysis {
        total_messages,
        total_characters,
        total_words,
        average_message_length: total_characters as f64 / total_messages as f64,
        senders: senders.into_iter().map(String::from).collect(),
        average_harmony: round3(sum / total_messages as f64),
        min_harmony: round3(min),
        max_harmony: round3(max),
    })
}
