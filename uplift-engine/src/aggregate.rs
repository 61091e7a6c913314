//! Aggregation over filtered row sets.
//!
//! Everything here is pure and total: empty input produces zeroed output,
//! and every ratio resolves division-by-zero to exactly 0 so no NaN or
//! infinity ever reaches a consumer or a sort.

use crate::model::{BranchAgg, ChannelAgg, MonthAgg, Row, Summary};
use crate::thresholds::{CANONICAL_MONTHS, COMPARATOR_CHANNEL, REFERENCE_CHANNEL};

/// The three grouping dimensions of the export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Branch,
    Month,
    Channel,
}

impl Dimension {
    fn key<'a>(&self, row: &'a Row) -> &'a str {
        match self {
            Dimension::Branch => &row.branch,
            Dimension::Month => &row.month,
            Dimension::Channel => &row.channel,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Totals over any row subset.
///
/// `uplift_pct` is computed over the totals — a group's uplift is weighted
/// by volume, never the mean of its members' uplifts.
pub fn summarize<'a, I>(rows: I) -> Summary
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut sales_before_total = 0.0;
    let mut sales_after_total = 0.0;
    let mut delta_total = 0.0;
    for row in rows {
        sales_before_total += finite_or_zero(row.sales_before);
        sales_after_total += finite_or_zero(row.sales_after);
        delta_total += finite_or_zero(row.delta);
    }
    let uplift_pct = if sales_before_total > 0.0 {
        (delta_total / sales_before_total) * 100.0
    } else {
        0.0
    };
    Summary {
        sales_before_total,
        sales_after_total,
        delta_total,
        uplift_pct,
    }
}

/// Group rows by a dimension, keys in first-seen order. Deterministic for
/// identical input order.
pub fn group_by<'a>(rows: &'a [Row], dimension: Dimension) -> Vec<(String, Vec<&'a Row>)> {
    let mut index: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    let mut groups: Vec<(String, Vec<&'a Row>)> = Vec::new();
    for row in rows {
        let key = dimension.key(row);
        match index.get(key) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(key, groups.len());
                groups.push((key.to_string(), vec![row]));
            }
        }
    }
    groups
}

fn contribution(delta: f64, grand_total_delta: f64) -> f64 {
    if grand_total_delta == 0.0 {
        0.0
    } else {
        (delta / grand_total_delta) * 100.0
    }
}

/// Per-channel rollup. Channels sorted ascending by name; contribution is
/// relative to the grand total of the rows passed in — what is currently
/// on screen, not the unfiltered dataset.
pub fn channel_rollup(rows: &[Row]) -> Vec<ChannelAgg> {
    let grand = summarize(rows);
    let mut groups = group_by(rows, Dimension::Channel);
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
        .into_iter()
        .map(|(channel, members)| {
            let summary = summarize(members.iter().copied());
            let contribution_pct = contribution(summary.delta_total, grand.delta_total);
            ChannelAgg {
                channel,
                summary,
                contribution_pct,
            }
        })
        .collect()
}

/// Per-month rollup in canonical order. Months outside the recognized
/// window are dropped by design, even if present in the raw data.
pub fn monthly_rollup(rows: &[Row]) -> Vec<MonthAgg> {
    let groups = group_by(rows, Dimension::Month);
    CANONICAL_MONTHS
        .iter()
        .filter_map(|&month| {
            groups
                .iter()
                .find(|(name, _)| name == month)
                .map(|(_, members)| MonthAgg {
                    month: month.to_string(),
                    summary: summarize(members.iter().copied()),
                })
        })
        .collect()
}

/// Per-branch rollup with mix, contribution and the reversed-pattern flag.
/// Branches appear in first-seen order; consumers sort as they see fit.
pub fn branch_rollup(rows: &[Row]) -> Vec<BranchAgg> {
    let grand = summarize(rows);
    group_by(rows, Dimension::Branch)
        .into_iter()
        .map(|(branch, members)| {
            let summary = summarize(members.iter().copied());

            let reference_before: f64 = members
                .iter()
                .filter(|r| r.channel == REFERENCE_CHANNEL)
                .map(|r| finite_or_zero(r.sales_before))
                .sum();
            let mix_reference_pct = if summary.sales_before_total > 0.0 {
                (reference_before / summary.sales_before_total) * 100.0
            } else {
                0.0
            };

            let contrib_uplift_pct = contribution(summary.delta_total, grand.delta_total);

            let reference: Vec<&Row> = members
                .iter()
                .copied()
                .filter(|r| r.channel == REFERENCE_CHANNEL)
                .collect();
            let comparator: Vec<&Row> = members
                .iter()
                .copied()
                .filter(|r| r.channel == COMPARATOR_CHANNEL)
                .collect();
            // Both channels must have data; absence cannot support the
            // comparison, so the flag is a concrete false.
            let reference_beats_comparator = !reference.is_empty()
                && !comparator.is_empty()
                && summarize(reference.iter().copied()).uplift_pct
                    > summarize(comparator.iter().copied()).uplift_pct;

            BranchAgg {
                branch,
                summary,
                mix_reference_pct,
                contrib_uplift_pct,
                reference_beats_comparator,
            }
        })
        .collect()
}
