//! Executive red flags.
//!
//! Five independent heuristics evaluated in a fixed order over the filtered
//! rows and their branch aggregates. All of them always run; only the
//! surfaced list is capped, so the cap changes how many flags are shown,
//! never which flags exist.

use serde::Serialize;

use crate::aggregate::summarize;
use crate::classify::Tone;
use crate::model::{BranchAgg, Row};
use crate::rank::{rank_branches, RankMode};
use crate::thresholds::{
    COMPARATOR_CHANNEL, CONCENTRATION_THRESHOLD, DARK_CHANNEL_THRESHOLD, HIGH_UPLIFT_THRESHOLD,
    MAX_SURFACED_FLAGS, MODERATE_MIX_THRESHOLD, MONTH_ANOMALY_DELTA, REFERENCE_CHANNEL,
    REFERENCE_MONTH,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    MonthAnomaly,
    TopSensitivity,
    Concentration,
    ExtremeMix,
    ReversedPattern,
}

/// One red flag for the executive summary.
#[derive(Clone, Debug, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub tone: Tone,
    pub title: String,
    pub detail: String,
}

/// Evaluate every heuristic, in order.
pub fn derive_insights(rows: &[Row], aggs: &[BranchAgg]) -> Vec<Insight> {
    let mut insights = Vec::new();

    // 1. Reference-month anomaly on the reference channel.
    let channel_rows: Vec<Row> = rows
        .iter()
        .filter(|r| r.channel == REFERENCE_CHANNEL)
        .cloned()
        .collect();
    let month_rows: Vec<Row> = channel_rows
        .iter()
        .filter(|r| r.month == REFERENCE_MONTH)
        .cloned()
        .collect();
    if !month_rows.is_empty() {
        let overall = summarize(&channel_rows);
        let month = summarize(&month_rows);
        if month.uplift_pct >= overall.uplift_pct + MONTH_ANOMALY_DELTA
            || month.uplift_pct >= HIGH_UPLIFT_THRESHOLD
        {
            insights.push(Insight {
                kind: InsightKind::MonthAnomaly,
                tone: Tone::Amber,
                title: format!("{REFERENCE_MONTH} atípico en {REFERENCE_CHANNEL}"),
                detail: format!(
                    "{REFERENCE_MONTH} registra {:.1}% de uplift en {REFERENCE_CHANNEL} \
                     contra {:.1}% del periodo completo.",
                    month.uplift_pct, overall.uplift_pct
                ),
            });
        }
    }

    // 2. Most price-sensitive branch.
    if let Some(top) = rank_branches(aggs, RankMode::Sensitivity, 1).first() {
        let (tone, title) = if top.agg.mix_reference_pct >= MODERATE_MIX_THRESHOLD {
            (Tone::Rose, format!("Riesgo de elasticidad en {}", top.agg.branch))
        } else {
            (Tone::Amber, format!("Sensibilidad elevada en {}", top.agg.branch))
        };
        insights.push(Insight {
            kind: InsightKind::TopSensitivity,
            tone,
            title,
            detail: format!(
                "{} encabeza el uplift con {:.1}% (mix {REFERENCE_CHANNEL} {:.1}%).",
                top.agg.branch, top.agg.summary.uplift_pct, top.agg.mix_reference_pct
            ),
        });
    }

    // 3. Concentration dependency on the largest contributor.
    if let Some(top) = rank_branches(aggs, RankMode::Impact, 1).first() {
        if top.agg.contrib_uplift_pct >= CONCENTRATION_THRESHOLD {
            insights.push(Insight {
                kind: InsightKind::Concentration,
                tone: Tone::Amber,
                title: format!("Dependencia de {}", top.agg.branch),
                detail: format!(
                    "{} aporta {:.1}% del diferencial total del filtro actual.",
                    top.agg.branch, top.agg.contrib_uplift_pct
                ),
            });
        }
    }

    // 4. Extreme channel mix.
    if let Some(top) = aggs.iter().max_by(|a, b| {
        a.mix_reference_pct
            .partial_cmp(&b.mix_reference_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.branch.cmp(&a.branch))
    }) {
        if top.mix_reference_pct > DARK_CHANNEL_THRESHOLD {
            insights.push(Insight {
                kind: InsightKind::ExtremeMix,
                tone: Tone::Rose,
                title: format!("Mix extremo en {}", top.branch),
                detail: format!(
                    "{} concentra {:.1}% de su venta base en {REFERENCE_CHANNEL}.",
                    top.branch, top.mix_reference_pct
                ),
            });
        }
    }

    // 5. Reversed pattern: delivery outpacing the walk-in channel.
    for agg in aggs.iter().filter(|a| a.reference_beats_comparator) {
        insights.push(Insight {
            kind: InsightKind::ReversedPattern,
            tone: Tone::Amber,
            title: format!("Patrón invertido en {}", agg.branch),
            detail: format!(
                "{REFERENCE_CHANNEL} supera a {COMPARATOR_CHANNEL} en uplift dentro de {}.",
                agg.branch
            ),
        });
    }

    insights
}

/// The capped list a consumer actually shows.
pub fn surface(insights: Vec<Insight>) -> Vec<Insight> {
    let total = insights.len();
    if total > MAX_SURFACED_FLAGS {
        log::debug!("surfacing {MAX_SURFACED_FLAGS} of {total} red flags");
    }
    insights.into_iter().take(MAX_SURFACED_FLAGS).collect()
}
