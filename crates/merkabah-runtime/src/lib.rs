//! # merkabah-runtime
//!
//! Concurrent multi-backend orchestration for Merkabah.
//!
//! This crate sends one prompt to several remote language models at once
//! and collects what each of them produced. The scoring itself lives in
//! `merkabah-core`; nothing here is deterministic.
//!
//! ## Guarantees
//!
//! - A round never fails as a whole; per-backend failures are data
//! - Every query is bounded by its backend's timeout
//! - Results do not depend on which backend answers first
//! - Credentials never appear in logs or `Debug` output
//!
//! ## Example
//!
//! ```rust,no_run
//! use merkabah_runtime::{Orchestrator, OrchestratorConfig};
//!
//! # async fn run() -> Result<(), merkabah_runtime::ConfigError> {
//! let config = OrchestratorConfig::from_yaml_file("merkabah.yaml")?;
//! let orchestrator = Orchestrator::new(config.resolve_from_env());
//!
//! let result = orchestrator.orchestrate("What is harmony?", None).await;
//! println!("{} backends answered, harmony {}", result.succeeded(), result.harmony);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod orchestrator;
pub mod providers;

pub use config::{BackendDescriptor, BackendSettings, ConfigError, OrchestratorConfig};
pub use orchestrator::{
    aggregate_harmony, render_report, BackendReply, OrchestrationResult, Orchestrator,
};
pub use providers::{ApiCredential, Backend, BackendError, CredentialSource, HttpBackend};
