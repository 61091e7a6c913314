//! Branch ranking and table sorting.
//!
//! All sorts are NaN-safe (NaN sinks to the end, so a bad value can never
//! float to the top of a ranking) and break ties on the branch name, so
//! output order is deterministic across runs and platforms.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::BranchAgg;

/// What the top-N ranking orders by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankMode {
    /// Absolute delta — which branches move the most money.
    Impact,
    /// Uplift percentage — which branches react the most.
    Sensitivity,
}

impl RankMode {
    fn value(&self, agg: &BranchAgg) -> f64 {
        match self {
            RankMode::Impact => agg.summary.delta_total,
            RankMode::Sensitivity => agg.summary.uplift_pct,
        }
    }
}

/// One entry of a top-N ranking. `bar_pct` scales the entry against the
/// maximum value within the shown top-N, not the global maximum.
#[derive(Clone, Debug, Serialize)]
pub struct RankedBranch {
    #[serde(flatten)]
    pub agg: BranchAgg,
    pub value: f64,
    pub bar_pct: f64,
}

/// Descending comparison with NaN pushed to the end and ties broken by
/// branch name ascending.
fn compare_desc(a_value: f64, b_value: f64, a_name: &str, b_name: &str) -> Ordering {
    match (a_value.is_nan(), b_value.is_nan()) {
        (true, true) => a_name.cmp(b_name),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b_value
            .partial_cmp(&a_value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_name.cmp(b_name)),
    }
}

/// Top-N branches under the given mode.
pub fn rank_branches(aggs: &[BranchAgg], mode: RankMode, n: usize) -> Vec<RankedBranch> {
    let mut ordered: Vec<&BranchAgg> = aggs.iter().collect();
    ordered.sort_by(|a, b| compare_desc(mode.value(a), mode.value(b), &a.branch, &b.branch));
    ordered.truncate(n);

    let max = ordered
        .iter()
        .map(|a| mode.value(a))
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    ordered
        .into_iter()
        .map(|agg| {
            let value = mode.value(agg);
            let bar_pct = if max > 0.0 && value.is_finite() {
                (value / max) * 100.0
            } else {
                0.0
            };
            RankedBranch {
                agg: agg.clone(),
                value,
                bar_pct,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Branch table sorting
// ---------------------------------------------------------------------------

/// Sortable columns of the branch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Branch,
    SalesBefore,
    Delta,
    UpliftPct,
    Mix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub dir: SortDir,
}

impl Default for SortSpec {
    /// The dashboard opens sorted by delta, largest first.
    fn default() -> Self {
        Self {
            key: SortKey::Delta,
            dir: SortDir::Desc,
        }
    }
}

/// Sort branch aggregates for display.
pub fn sort_branches(aggs: &[BranchAgg], spec: SortSpec) -> Vec<BranchAgg> {
    let mut sorted = aggs.to_vec();
    sorted.sort_by(|a, b| {
        let ord = match spec.key {
            SortKey::Branch => a.branch.cmp(&b.branch),
            SortKey::SalesBefore => numeric_asc(
                a.summary.sales_before_total,
                b.summary.sales_before_total,
            ),
            SortKey::Delta => numeric_asc(a.summary.delta_total, b.summary.delta_total),
            SortKey::UpliftPct => numeric_asc(a.summary.uplift_pct, b.summary.uplift_pct),
            SortKey::Mix => numeric_asc(a.mix_reference_pct, b.mix_reference_pct),
        };
        let ord = match spec.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        ord.then_with(|| a.branch.cmp(&b.branch))
    });
    sorted
}

/// Ascending numeric ordering with NaN last.
fn numeric_asc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
