//! Centralized thresholds and domain constants for uplift analysis.
//!
//! These values are calibrated for the Jan–May price-change comparison
//! window the export job produces. Changing a threshold here affects BOTH
//! branch classification (in `classify.rs`) and the executive red flags
//! (in `insight.rs`).

/// Months recognized by the monthly view, in display order. Rows carrying a
/// month outside this list still count toward KPI, channel and branch
/// aggregates, but are dropped from the monthly rollup.
pub const CANONICAL_MONTHS: [&str; 5] = ["Enero", "Febrero", "Marzo", "Abril", "Mayo"];

/// The month the executive summary scrutinizes for channel anomalies
/// (the last month of the comparison window).
pub const REFERENCE_MONTH: &str = "Mayo";

/// Delivery channel whose share of pre-period sales defines a branch's mix.
pub const REFERENCE_CHANNEL: &str = "UBER";

/// Walk-in channel the reference channel is compared against for the
/// reversed-pattern check.
pub const COMPARATOR_CHANNEL: &str = "MOSTRADOR";

/// Mix percentage at or above which a branch is considered concentrated in
/// the delivery channel to an extreme degree.
pub const DARK_CHANNEL_THRESHOLD: f64 = 50.0;

/// Uplift percentage at or above which a branch (or a month) is treated as
/// highly price-sensitive. Matches the red badge boundary of the dashboards.
pub const HIGH_UPLIFT_THRESHOLD: f64 = 8.0;

/// Mix percentage at or above which elevated uplift is read as elasticity
/// risk rather than healthy growth.
pub const MODERATE_MIX_THRESHOLD: f64 = 30.0;

/// Percentage points the reference month must exceed the channel's overall
/// uplift by before it is flagged as an anomaly.
pub const MONTH_ANOMALY_DELTA: f64 = 2.0;

/// Share of total delta a single branch may contribute before the summary
/// flags a concentration dependency.
pub const CONCENTRATION_THRESHOLD: f64 = 25.0;

/// Maximum number of red flags surfaced to the consumer. Evaluation is not
/// capped, only the surfaced list.
pub const MAX_SURFACED_FLAGS: usize = 5;

/// Placeholder for text fields the export left empty or malformed.
pub const FALLBACK_TEXT: &str = "Sin dato";
