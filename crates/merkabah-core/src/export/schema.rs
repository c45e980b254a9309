//! JSON Schema validation for export documents.
//!
//! Exports are validated against `export.schema.json` before they are
//! deserialized, so a hand-edited or foreign file is rejected with a list of
//! concrete violations rather than a single serde error.

use std::sync::OnceLock;

/// Embedded export schema (loaded at compile time).
const EXPORT_SCHEMA_JSON: &str = include_str!("export.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(EXPORT_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate an export document against the schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_export_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> serde_json::Value {
        json!({
            "extracted_at": "2024-03-01T10:00:00Z",
            "messages": [{
                "timestamp": "01/02/2023 14:05",
                "sender": "Alice",
                "body": "Hello there!",
                "length": 12,
                "word_count": 2
            }],
            "harmony_scores": { "01/02/2023 14:05": 0.2 },
            "analysis": {
                "total_messages": 1,
                "total_characters": 12,
                "total_words": 2,
                "average_message_length": 12.0,
                "senders": ["Alice"],
                "average_harmony": 0.2,
                "min_harmony": 0.2,
                "max_harmony": 0.2
            }
        })
    }

    #[test]
    fn test_valid_document_passes() {
        assert!(validate_export_schema(&valid()).is_ok());
    }

    #[test]
    fn test_missing_analysis_fails() {
        let mut doc = valid();
        doc.as_object_mut().unwrap().remove("analysis");
        assert!(validate_export_schema(&doc).is_err());
    }

    #[test]
    fn test_score_out_of_range_fails() {
        let mut doc = valid();
        doc["harmony_scores"]["01/02/2023 14:05"] = json!(1.5);
        let errors = validate_export_schema(&doc).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("harmony_scores")));
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let mut doc = valid();
        doc["messages"][0]["timestamp"] = json!("14:05 01/02/2023");
        assert!(validate_export_schema(&doc).is_err());
    }

    #[test]
    fn test_unknown_field_fails() {
        let mut doc = valid();
        doc["status"] = json!("complete");
        assert!(validate_export_schema(&doc).is_err());
    }
}
