//! # merkabah-core
//!
//! Deterministic scoring and routing for Merkabah.
//!
//! This crate answers, for any piece of conversational text:
//! - How harmonious is it? (a `[0, 1]` content-quality score)
//! - Which tier handles it, and which backend is responsible?
//!
//! It also ingests line-oriented chat exports, aggregates batch statistics,
//! and reads and writes the JSON export document.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same text always produces the same score
//! 2. **No network**: Nothing here talks to a remote service
//! 3. **Total**: Scoring and classification accept every input
//!
//! ## Example
//!
//! ```rust
//! use merkabah_core::{classify, score, MessageIngester, Tier};
//!
//! let messages: Vec<_> =
//!     MessageIngester::parse(["[14:05, 01/02/2023] Alice: Hello there!"]).collect();
//! let harmony = score(&messages[0].body);
//! assert_eq!(classify(harmony), Tier::Review);
//! ```

pub mod backend;
pub mod export;
pub mod harmony;
pub mod ingest;
pub mod platform;
pub mod tier;

// Re-export main types at crate root
pub use backend::{BackendId, UnknownBackend};
pub use export::{default_export_name, ExportDocument, ExportError, ExportReceipt};
pub use harmony::{round3, score, HarmonyBreakdown};
pub use ingest::{analyze, BatchAnalysis, IngestError, Message, MessageIngester};
pub use platform::{Platform, PlatformCapabilities, PlatformError};
pub use tier::{classify, route, RoutingDecision, Tier};
