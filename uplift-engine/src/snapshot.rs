//! Dashboard snapshot assembly.
//!
//! One serializable value per filter change: KPIs, the three grouped views,
//! classified branches, capped red flags and the top-N ranking. This is the
//! whole contract a presentation layer consumes; it is recomputed on every
//! interaction and discarded when superseded.

use serde::Serialize;

use crate::aggregate::{branch_rollup, channel_rollup, monthly_rollup, summarize};
use crate::classify::{classify_branch, percentile_75, BranchCategory, Tone};
use crate::insight::{derive_insights, surface, Insight};
use crate::loader::parse_generated_at;
use crate::model::{
    BranchAgg, BranchSummary, ChannelAgg, Dataset, FilterSpec, MonthAgg, Row, ScatterStats,
    Summary,
};
use crate::rank::{rank_branches, sort_branches, RankMode, RankedBranch, SortSpec};

/// Distinct values available for each selector, derived from the full
/// (unfiltered) row set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterOptions {
    pub branches: Vec<String>,
    pub months: Vec<String>,
    pub channels: Vec<String>,
}

impl FilterOptions {
    /// Branches and channels sorted ascending; months kept in first-seen
    /// order (the export already emits them chronologically).
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut branches: Vec<String> = Vec::new();
        let mut months: Vec<String> = Vec::new();
        let mut channels: Vec<String> = Vec::new();
        for row in rows {
            if !branches.contains(&row.branch) {
                branches.push(row.branch.clone());
            }
            if !months.contains(&row.month) {
                months.push(row.month.clone());
            }
            if !channels.contains(&row.channel) {
                channels.push(row.channel.clone());
            }
        }
        branches.sort();
        channels.sort();
        Self {
            branches,
            months,
            channels,
        }
    }
}

/// A branch aggregate with its category attached.
#[derive(Clone, Debug, Serialize)]
pub struct ClassifiedBranch {
    #[serde(flatten)]
    pub agg: BranchAgg,
    pub category: BranchCategory,
    pub label: String,
    pub tone: Tone,
}

/// Everything a consumer needs to render one filtered view.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    /// Normalized RFC-3339 export timestamp, when parseable.
    pub generated_at: Option<String>,
    pub filters: FilterSpec,
    pub kpi: Summary,
    pub channels: Vec<ChannelAgg>,
    pub months: Vec<MonthAgg>,
    pub branches: Vec<ClassifiedBranch>,
    pub insights: Vec<Insight>,
    pub ranking: Vec<RankedBranch>,
    pub options: FilterOptions,
    /// Pre-computed scatter statistics, passed through untouched.
    pub scatter: ScatterStats,
    /// Pre-computed branch points for the scatter view, passed through.
    pub scatter_branches: Vec<BranchSummary>,
    /// Size of the detail table (served directly from the dataset).
    pub drilldown_rows: usize,
}

impl DashboardSnapshot {
    pub fn build(
        dataset: &Dataset,
        filtered: &[Row],
        spec: &FilterSpec,
        sort: SortSpec,
        rank_mode: RankMode,
        top_n: usize,
    ) -> Self {
        let kpi = summarize(filtered);
        let channels = channel_rollup(filtered);
        let months = monthly_rollup(filtered);
        let aggs = branch_rollup(filtered);

        let volumes: Vec<f64> = aggs.iter().map(|a| a.summary.sales_before_total).collect();
        let p75 = percentile_75(&volumes);

        let branches = sort_branches(&aggs, sort)
            .into_iter()
            .map(|agg| {
                let classification = classify_branch(&agg, p75);
                ClassifiedBranch {
                    label: classification.category.to_string(),
                    category: classification.category,
                    tone: classification.tone,
                    agg,
                }
            })
            .collect();

        let insights = surface(derive_insights(filtered, &aggs));
        let ranking = rank_branches(&aggs, rank_mode, top_n);

        let generated_at = dataset
            .meta
            .generated_at
            .as_deref()
            .and_then(parse_generated_at)
            .map(|ts| ts.to_rfc3339());

        log::debug!(
            "snapshot: {} rows, {} branches, {} insights",
            filtered.len(),
            aggs.len(),
            insights.len()
        );

        Self {
            generated_at,
            filters: spec.clone(),
            kpi,
            channels,
            months,
            branches,
            insights,
            ranking,
            options: FilterOptions::from_rows(&dataset.rows),
            scatter: dataset.scatter.clone(),
            scatter_branches: dataset.branches.clone(),
            drilldown_rows: dataset.drilldown.len(),
        }
    }
}
