//! Row export for download actions.
//!
//! CSV columns come from the record's fields in declaration order; values
//! containing a comma, quote or newline are quoted with doubled internal
//! quotes. JSON export wraps the filtered rows with the export metadata and
//! the filter spec that produced them, and round-trips losslessly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::model::{FilterSpec, Meta, Row};

/// Serialize flat records to CSV with a header row.
pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut bytes);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    let text = String::from_utf8(bytes)?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// The JSON download payload: metadata, the active filters, and the rows
/// they selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub meta: Meta,
    pub filters: FilterSpec,
    pub rows: Vec<Row>,
}

/// Pretty-printed JSON payload for the export action.
pub fn export_payload(
    meta: &Meta,
    filters: &FilterSpec,
    rows: &[Row],
) -> Result<String, ExportError> {
    let payload = ExportPayload {
        meta: meta.clone(),
        filters: filters.clone(),
        rows: rows.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Parse a payload back. Used to verify round-trips and by tooling that
/// re-imports a downloaded view.
pub fn parse_payload(json: &str) -> Result<ExportPayload, ExportError> {
    Ok(serde_json::from_str(json)?)
}

/// Convenience for re-importing just the rows of a serialized row set.
pub fn parse_rows<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, ExportError> {
    Ok(serde_json::from_str(json)?)
}
