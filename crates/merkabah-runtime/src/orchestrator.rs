//! Concurrent fan-out of one prompt to several backends.
//!
//! The orchestrator implements:
//! - Parallel fan-out to the selected backends via `join_all`
//! - A per-backend timeout around every query
//! - Deterministic fan-in into an ordered response map
//! - Aggregate harmony over the collected outcomes
//!
//! A round never fails as a whole. Each backend's failure is recorded as a
//! [`BackendReply::Error`] next to the others' successes.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::time::Instant;

use merkabah_core::{round3, BackendId};

use crate::config::BackendDescriptor;
use crate::providers::{Backend, BackendError, HttpBackend};

/// Aggregate harmony is average outcome length over this many characters.
pub const AGGREGATE_TARGET_CHARS: f64 = 1000.0;

/// Characters of each response shown in a synthesis report.
pub const REPORT_EXCERPT_CHARS: usize = 200;

/// What one backend produced in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply {
    Ok(String),
    Error(BackendError),
}

impl BackendReply {
    /// Response text, or the error's display string.
    pub fn text(&self) -> String {
        match self {
            BackendReply::Ok(text) => text.clone(),
            BackendReply::Error(e) => e.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, BackendReply::Ok(_))
    }
}

impl From<Result<String, BackendError>> for BackendReply {
    fn from(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) => BackendReply::Ok(text),
            Err(e) => BackendReply::Error(e),
        }
    }
}

impl Serialize for BackendReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BackendReply::Ok(text) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            BackendReply::Error(e) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("status", "error")?;
                map.serialize_entry("kind", e.kind())?;
                map.serialize_entry("message", &e.to_string())?;
                map.end()
            }
        }
    }
}

/// Outcome of one orchestration round.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    pub prompt: String,

    /// Keyed by backend id; independent of completion order.
    pub responses: BTreeMap<BackendId, BackendReply>,

    pub harmony: f64,

    pub timestamp: DateTime<Utc>,
}

impl OrchestrationResult {
    pub fn succeeded(&self) -> usize {
        self.responses.values().filter(|r| r.is_ok()).count()
    }
}

/// Average outcome length in characters over 1000, capped at 1.0.
///
/// Error outcomes count with their display string. No outcomes scores 0.0.
pub fn aggregate_harmony(responses: &BTreeMap<BackendId, BackendReply>) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }

    let total: usize = responses.values().map(|r| r.text().chars().count()).sum();
    let average = total as f64 / responses.len() as f64;
    round3((average / AGGREGATE_TARGET_CHARS).min(1.0))
}

/// Plain-text synthesis report.
///
/// Every backend gets a section, in [`BackendId::ALL`] order; those absent
/// from the round show `N/A`.
pub fn render_report(result: &OrchestrationResult) -> String {
    let mut report = String::from("=== MERKABAH SYNTHESIS ===\n");
    report.push_str(&format!("Prompt: {}\n", result.prompt));

    for id in BackendId::ALL {
        let excerpt: String = match result.responses.get(&id) {
            Some(reply) => reply.text().chars().take(REPORT_EXCERPT_CHARS).collect(),
            None => "N/A".to_string(),
        };
        report.push_str(&format!("\n[{} - {}]: {}...\n", id, id.role(), excerpt));
    }

    report.push_str(&format!("\nHarmony Score: {}\n", result.harmony));
    report.push_str("===\n");
    report
}

/// Fans prompts out to the configured backends.
///
/// # Architecture
/// - The backend table sits behind a read-write lock; a round takes a
///   snapshot of the `Arc` clients and drops the lock before awaiting
/// - Reconfiguration replaces one entry and never waits on network I/O
/// - HTTP backends, including reconfigured ones, share one connection pool
pub struct Orchestrator {
    backends: RwLock<BTreeMap<BackendId, Arc<dyn Backend>>>,
    client: reqwest::Client,
}

impl Orchestrator {
    /// HTTP backends for every descriptor, sharing one connection pool.
    pub fn new(descriptors: impl IntoIterator<Item = BackendDescriptor>) -> Self {
        let client = reqwest::Client::new();
        let table = descriptors
            .into_iter()
            .map(|descriptor| {
                let backend = HttpBackend::with_client(descriptor, client.clone());
                (backend.id(), Arc::new(backend) as Arc<dyn Backend>)
            })
            .collect();
        Self {
            backends: RwLock::new(table),
            client,
        }
    }

    /// Use the given backends as-is. A later entry replaces an earlier one
    /// with the same id.
    pub fn with_backends(backends: impl IntoIterator<Item = Arc<dyn Backend>>) -> Self {
        let table = backends.into_iter().map(|b| (b.id(), b)).collect();
        Self {
            backends: RwLock::new(table),
            client: reqwest::Client::new(),
        }
    }

    /// Replace the client for the descriptor's backend. The new client
    /// joins the orchestrator's connection pool.
    pub fn configure_backend(&self, descriptor: BackendDescriptor) {
        tracing::info!(
            backend = %descriptor.id,
            endpoint = %descriptor.endpoint,
            model = %descriptor.model,
            "Backend reconfigured"
        );
        self.register(Arc::new(HttpBackend::with_client(descriptor, self.client.clone())));
    }

    pub fn register(&self, backend: Arc<dyn Backend>) {
        self.backends.write().insert(backend.id(), backend);
    }

    pub fn remove(&self, id: BackendId) -> bool {
        self.backends.write().remove(&id).is_some()
    }

    /// Configured ids, in report order.
    pub fn configured(&self) -> Vec<BackendId> {
        self.backends.read().keys().copied().collect()
    }

    /// Send `prompt` to the requested backends (all configured when `None`)
    /// and collect every outcome.
    ///
    /// # Execution Flow
    /// 1. Snapshot the selected clients, skipping unconfigured ids
    /// 2. Fan-out: query all of them concurrently, each under its timeout
    /// 3. Fan-in: merge outcomes into the ordered map after the join
    /// 4. Score the round
    pub async fn orchestrate(
        &self,
        prompt: &str,
        requested: Option<&[BackendId]>,
    ) -> OrchestrationResult {
        let selected = self.snapshot(requested);
        tracing::info!(backends = selected.len(), "Orchestrating prompt");

        let queries = selected.into_iter().map(|backend| async move {
            let id = backend.id();
            let limit = backend.timeout();
            let started = Instant::now();

            let outcome = match tokio::time::timeout(limit, backend.query(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Unreachable {
                    backend: id,
                    detail: format!("timed out after {:?}", limit),
                }),
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(text) => {
                    tracing::debug!(backend = %id, elapsed_ms, chars = text.chars().count(), "Backend replied")
                }
                Err(e) => tracing::warn!(backend = %id, elapsed_ms, error = %e, "Backend failed"),
            }
            (id, BackendReply::from(outcome))
        });

        let responses: BTreeMap<_, _> = join_all(queries).await.into_iter().collect();
        let harmony = aggregate_harmony(&responses);

        OrchestrationResult {
            prompt: prompt.to_string(),
            responses,
            harmony,
            timestamp: Utc::now(),
        }
    }

    /// Orchestrate across every configured backend and render the report.
    pub async fn synthesize(&self, prompt: &str) -> String {
        let result = self.orchestrate(prompt, None).await;
        render_report(&result)
    }

    fn snapshot(&self, requested: Option<&[BackendId]>) -> Vec<Arc<dyn Backend>> {
        let table = self.backends.read();
        match requested {
            None => table.values().cloned().collect(),
            Some(ids) => ids
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|id| {
                    let backend = table.get(&id).cloned();
                    if backend.is_none() {
                        tracing::warn!(backend = %id, "Requested backend is not configured, skipping");
                    }
                    backend
                })
                .collect(),
        }
    }
}
