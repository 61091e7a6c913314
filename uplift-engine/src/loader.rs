//! Export loading.
//!
//! The export is a static JSON document produced out-of-band. Sources only
//! ever read: the HTTP source refuses any non-GET method before a single
//! byte leaves the process, and decoding is lenient (see `model`) so a
//! malformed document yields zeroed fields rather than a failed load.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;

use crate::error::LoadError;
use crate::model::Dataset;
use crate::util;

/// A place the export can be fetched from.
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Fetch and decode the export into a normalized dataset.
    async fn fetch(&self) -> Result<Dataset, LoadError>;

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}

/// Refuse anything that could mutate the endpoint. Not recoverable.
pub fn assert_read_only(method: &Method) -> Result<(), LoadError> {
    if *method != Method::GET {
        return Err(LoadError::ReadOnlyViolation {
            method: method.to_string(),
        });
    }
    Ok(())
}

/// Fetches the export over HTTP. GET only.
pub struct HttpExportSource {
    url: String,
    client: reqwest::Client,
}

impl HttpExportSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Issue a request with an explicit method. Every path into the
    /// endpoint funnels through the read-only guard.
    pub async fn request(&self, method: Method) -> Result<Dataset, LoadError> {
        assert_read_only(&method)?;
        let res = self.client.get(&self.url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
            });
        }
        let body = res.text().await?;
        let dataset: Dataset = serde_json::from_str(&body)?;
        log::info!(
            "loaded export from {} ({} rows, {} branches)",
            self.url,
            dataset.rows.len(),
            dataset.branches.len()
        );
        Ok(dataset)
    }
}

#[async_trait]
impl ExportSource for HttpExportSource {
    async fn fetch(&self) -> Result<Dataset, LoadError> {
        self.request(Method::GET).await
    }
}

/// Reads the export from a local file. Used by the CLI and by tests.
pub struct FileExportSource {
    path: PathBuf,
}

impl FileExportSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ExportSource for FileExportSource {
    async fn fetch(&self) -> Result<Dataset, LoadError> {
        let body = std::fs::read_to_string(&self.path)?;
        let dataset: Dataset = serde_json::from_str(&body)?;
        log::info!(
            "loaded export from {} ({} rows)",
            self.path.display(),
            dataset.rows.len()
        );
        Ok(dataset)
    }
}

/// Parse the export's `generated_at` timestamp.
///
/// The export job writes ISO-ish timestamps with microsecond precision and
/// sometimes a `+00:00` offset; both are normalized before parsing.
/// Unparseable values yield `None` rather than an error — the timestamp is
/// informational, not load-bearing.
pub fn parse_generated_at(value: &str) -> Option<DateTime<FixedOffset>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }

    // Truncate fractional seconds to milliseconds.
    let truncated = match v.find('.') {
        Some(dot) => {
            let head = &v[..dot];
            let rest = &v[dot + 1..];
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            let tail = &rest[digits..];
            let kept = &rest[..digits.min(3)];
            if kept.is_empty() {
                format!("{head}{tail}")
            } else {
                format!("{head}.{kept}{tail}")
            }
        }
        None => v.to_string(),
    };

    let normalized = match truncated.strip_suffix("+00:00") {
        Some(stripped) => format!("{stripped}Z"),
        None => truncated,
    };

    DateTime::parse_from_rfc3339(&normalized).ok().or_else(|| {
        // Offset-less timestamps are taken as UTC.
        chrono::NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_guard_allows_get() {
        assert!(assert_read_only(&Method::GET).is_ok());
    }

    #[test]
    fn read_only_guard_blocks_write_methods() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let err = assert_read_only(&method).unwrap_err();
            match err {
                LoadError::ReadOnlyViolation { method: m } => {
                    assert_eq!(m, method.to_string())
                }
                other => panic!("expected ReadOnlyViolation, got {other:?}"),
            }
        }
    }

    #[test]
    fn generated_at_truncates_microseconds() {
        let parsed = parse_generated_at("2026-05-31T18:04:22.123456Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn generated_at_rewrites_utc_offset() {
        let parsed = parse_generated_at("2026-05-31T18:04:22.123456+00:00").unwrap();
        assert_eq!(parsed.timestamp(), parse_generated_at("2026-05-31T18:04:22Z").unwrap().timestamp());
    }

    #[test]
    fn generated_at_accepts_offsetless_timestamps() {
        assert!(parse_generated_at("2026-05-31T18:04:22").is_some());
    }

    #[test]
    fn generated_at_rejects_garbage_quietly() {
        assert!(parse_generated_at("").is_none());
        assert!(parse_generated_at("ayer").is_none());
    }

    #[tokio::test]
    async fn file_source_loads_and_normalizes() {
        let path = std::env::temp_dir().join("uplift_engine_loader_test.json");
        std::fs::write(
            &path,
            r#"{"meta":{"generated_at":"2026-05-31T18:04:22.123456+00:00"},
                "rows":[{"sucursal":"Centro","mes":"Enero","canal":"UBER",
                         "venta_2025":1000,"venta_2026":1100,"diferencial":100,"uplift_pct":10}]}"#,
        )
        .unwrap();

        let dataset = FileExportSource::new(&path).fetch().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(dataset.rows.len(), 1);
        assert_eq!(dataset.rows[0].branch, "Centro");
        let stamp = dataset.meta.generated_at.as_deref().unwrap();
        assert!(parse_generated_at(stamp).is_some());
    }

    #[tokio::test]
    async fn file_source_surfaces_missing_file() {
        let source = FileExportSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch().await, Err(LoadError::Io(_))));
    }
}
