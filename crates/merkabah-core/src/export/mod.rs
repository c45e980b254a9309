//! JSON export of an analyzed batch.

mod document;
mod schema;

pub use document::{default_export_name, ExportDocument, ExportError, ExportReceipt};
pub use schema::validate_export_schema;
