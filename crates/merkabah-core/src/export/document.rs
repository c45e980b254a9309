//! The persisted export document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::validate_export_schema;
use crate::ingest::{analyze, harmony_by_timestamp, BatchAnalysis, IngestError, Message};

/// Errors that can occur when writing or reading exports.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to access export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode export JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Messages, their harmony scores and the batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub extracted_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub harmony_scores: BTreeMap<String, f64>,
    pub analysis: BatchAnalysis,
}

/// Where an export landed and how large it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReceipt {
    pub exported_to: PathBuf,
    pub size: usize,
}

impl ExportDocument {
    /// Build a document from an ingested batch.
    pub fn from_messages(
        messages: Vec<Message>,
        extracted_at: DateTime<Utc>,
    ) -> Result<Self, ExportError> {
        let analysis = analyze(&messages)?;
        let harmony_scores = harmony_by_timestamp(&messages);

        Ok(Self {
            extracted_at,
            messages,
            harmony_scores,
            analysis,
        })
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and schema-check a document.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        validate_export_schema(&value).map_err(ExportError::Schema)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Write the document to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<ExportReceipt, ExportError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, &json)?;

        tracing::info!(path = %path.display(), bytes = json.len(), "Wrote export");

        Ok(ExportReceipt {
            exported_to: path.to_path_buf(),
            size: json.len(),
        })
    }

    /// Read and schema-check a document from `path`.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// Default export file name for a given moment.
pub fn default_export_name(at: DateTime<Utc>) -> String {
    format!("merkabah_export_{}.json", at.format("%Y%m%d_%H%M%S"))
}
