//! Chat export ingestion and batch analysis.

mod analysis;
mod parser;

pub use analysis::{analyze, harmony_by_timestamp, BatchAnalysis};
pub use parser::{IngestError, Message, MessageIngester, Messages};
