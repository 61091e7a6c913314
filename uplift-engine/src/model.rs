use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::thresholds::FALLBACK_TEXT;

// ---------------------------------------------------------------------------
// Row: the atomic fact
// ---------------------------------------------------------------------------

/// One branch × month × channel observation from the export.
///
/// Rows are immutable facts: `delta` and `uplift_pct` come pre-computed by
/// the export job and are never recomputed here. Deserialization accepts
/// both the canonical field names and the export job's legacy Spanish names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(alias = "sucursal", default = "fallback_text", deserialize_with = "lenient_text")]
    pub branch: String,
    #[serde(alias = "mes", default = "fallback_text", deserialize_with = "lenient_text")]
    pub month: String,
    #[serde(alias = "canal", default = "fallback_text", deserialize_with = "lenient_text")]
    pub channel: String,
    #[serde(alias = "venta_2025", default, deserialize_with = "lenient_f64")]
    pub sales_before: f64,
    #[serde(alias = "venta_2026", default, deserialize_with = "lenient_f64")]
    pub sales_after: f64,
    #[serde(alias = "diferencial", default, deserialize_with = "lenient_f64")]
    pub delta: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub uplift_pct: f64,
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// A single dimension filter: either the "All" sentinel or one exact value.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    One(String),
}

impl Selection {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::One(v) => v == value,
        }
    }

    /// The string form used in filter keys and serialized specs.
    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => "All",
            Selection::One(v) => v,
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        // "Todas"/"Todos" are the sentinels the original selectors emitted.
        match value {
            "All" | "Todas" | "Todos" | "" => Selection::All,
            other => Selection::One(other.to_string()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Selection::from(s.as_str()))
    }
}

/// Immutable filter state. Transitions produce a new spec instead of
/// mutating in place, so every aggregation run sees one frozen spec.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, alias = "sucursal")]
    pub branch: Selection,
    #[serde(default, alias = "mes")]
    pub month: Selection,
    #[serde(default, alias = "canal")]
    pub channel: Selection,
    #[serde(default)]
    pub search: String,
}

impl FilterSpec {
    pub fn with_branch(&self, branch: Selection) -> Self {
        Self { branch, ..self.clone() }
    }

    pub fn with_month(&self, month: Selection) -> Self {
        Self { month, ..self.clone() }
    }

    pub fn with_channel(&self, channel: Selection) -> Self {
        Self { channel, ..self.clone() }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self { search: search.into(), ..self.clone() }
    }

    /// Search text as it is matched: trimmed and lowercased.
    pub fn normalized_search(&self) -> String {
        self.search.trim().to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Totals over any row subset. `uplift_pct` is computed over the totals
/// (volume-weighted), never averaged across member rows.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub sales_before_total: f64,
    pub sales_after_total: f64,
    pub delta_total: f64,
    pub uplift_pct: f64,
}

/// Per-channel rollup with contribution relative to the filtered total.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelAgg {
    pub channel: String,
    #[serde(flatten)]
    pub summary: Summary,
    pub contribution_pct: f64,
}

/// Per-month rollup, restricted to the canonical month window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthAgg {
    pub month: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Per-branch rollup with mix, contribution and the reversed-pattern flag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchAgg {
    pub branch: String,
    #[serde(flatten)]
    pub summary: Summary,
    /// Share of the reference channel's pre-period sales within the
    /// branch's pre-period total, in percent.
    pub mix_reference_pct: f64,
    /// Branch delta as a share of the filtered grand-total delta, in
    /// percent. Exactly 0 when the grand total is 0.
    pub contrib_uplift_pct: f64,
    /// True iff both the reference and comparator channels have rows for
    /// this branch AND the reference channel's own uplift exceeds the
    /// comparator's. A missing channel yields a concrete false: absence of
    /// data cannot support the comparison.
    pub reference_beats_comparator: bool,
}

// ---------------------------------------------------------------------------
// Export passthrough views
// ---------------------------------------------------------------------------

/// Branch summary pre-computed by the export job. Consumed as-is by the
/// scatter view, never recomputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchSummary {
    #[serde(alias = "sucursal", default = "fallback_text", deserialize_with = "lenient_text")]
    pub branch: String,
    #[serde(alias = "venta_2025", default, deserialize_with = "lenient_f64")]
    pub sales_before: f64,
    #[serde(alias = "diferencial", default, deserialize_with = "lenient_f64")]
    pub delta: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub uplift_pct: f64,
    #[serde(alias = "mix_uber_2025", default, deserialize_with = "lenient_f64")]
    pub mix_reference_pct: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub contrib_uplift_pct: f64,
}

/// Scatter-plot statistics pre-computed by the export job.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ScatterStats {
    #[serde(alias = "median_mix_uber", default, deserialize_with = "lenient_f64")]
    pub median_mix_reference: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub median_uplift: f64,
    #[serde(alias = "corr_mix_uber_uplift", default, deserialize_with = "lenient_f64")]
    pub corr_mix_uplift: f64,
}

/// One row of the branch × month × channel detail table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillRow {
    #[serde(alias = "mes", default = "fallback_text", deserialize_with = "lenient_text")]
    pub month: String,
    #[serde(alias = "canal", default = "fallback_text", deserialize_with = "lenient_text")]
    pub channel: String,
    #[serde(alias = "sucursal", default = "fallback_text", deserialize_with = "lenient_text")]
    pub branch: String,
    #[serde(alias = "venta_2025", default, deserialize_with = "lenient_f64")]
    pub sales_before: f64,
    #[serde(alias = "diferencial", default, deserialize_with = "lenient_f64")]
    pub delta: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub uplift_pct: f64,
}

/// Export metadata. `generated_at` is kept raw here; timestamp
/// normalization happens in the loader. Unknown keys pass through so an
/// export round-trip keeps whatever the job wrote.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The whole normalized export. Every collection defaults to empty, every
/// row field to a typed zero/placeholder, so aggregation never sees a
/// malformed value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(alias = "sucursales", default)]
    pub branches: Vec<BranchSummary>,
    #[serde(default)]
    pub scatter: ScatterStats,
    #[serde(default)]
    pub drilldown: Vec<DrillRow>,
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

fn fallback_text() -> String {
    FALLBACK_TEXT.to_string()
}

/// Numbers tolerate null, strings and garbage: anything non-finite or
/// unparseable decodes to 0.0 so downstream sums always succeed.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Text fields tolerate anything: scalars render to their string form,
/// empty or structured values collapse to the shared placeholder.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    };
    Ok(if text.is_empty() { fallback_text() } else { text })
}
