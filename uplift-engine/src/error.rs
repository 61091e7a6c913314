//! Engine error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use thiserror::Error;

/// Failures while fetching or decoding the export.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The read-only contract: anything but GET is refused before any I/O.
    #[error("read-only mode: blocked {method} request to the data endpoint")]
    ReadOnlyViolation { method: String },

    /// Non-2xx response from the export endpoint. Fatal for this load.
    #[error("export fetch failed with HTTP {status}")]
    Status { status: u16 },

    #[error("export request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("export file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures while serializing engine output for a consumer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV flush error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
