//! Branch classification.
//!
//! Each branch aggregate maps to exactly one category through an ordered
//! rule chain. The order is a behavioral contract: a branch satisfying
//! several rules receives the first matching label.

use std::fmt;

use serde::Serialize;

use crate::model::BranchAgg;
use crate::thresholds::{
    DARK_CHANNEL_THRESHOLD, HIGH_UPLIFT_THRESHOLD, MODERATE_MIX_THRESHOLD,
};

/// Chip tone a category renders with (the dashboard's badge palette).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Slate,
    Emerald,
    Amber,
    Rose,
}

/// Mutually exclusive branch categories, in rule order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BranchCategory {
    ExtremeConcentration,
    Risk,
    CriticalVolume,
    Conservative,
}

impl BranchCategory {
    pub fn tone(&self) -> Tone {
        match self {
            BranchCategory::ExtremeConcentration => Tone::Rose,
            BranchCategory::Risk => Tone::Amber,
            BranchCategory::CriticalVolume => Tone::Emerald,
            BranchCategory::Conservative => Tone::Slate,
        }
    }
}

impl fmt::Display for BranchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchCategory::ExtremeConcentration => write!(f, "Concentración extrema de canal"),
            BranchCategory::Risk => write!(f, "Riesgo"),
            BranchCategory::CriticalVolume => write!(f, "Volumen crítico"),
            BranchCategory::Conservative => write!(f, "Conservador"),
        }
    }
}

/// A category plus its display tone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: BranchCategory,
    pub tone: Tone,
}

/// 75th percentile of a value set: sort ascending, take the element at
/// `floor(0.75 * (n - 1))`. Empty input yields 0.
pub fn percentile_75(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = (0.75 * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx]
}

/// Classify one branch against the current filtered set's p75 volume.
/// First match wins.
pub fn classify_branch(agg: &BranchAgg, p75_sales: f64) -> Classification {
    let category = if agg.mix_reference_pct >= DARK_CHANNEL_THRESHOLD {
        BranchCategory::ExtremeConcentration
    } else if agg.summary.uplift_pct >= HIGH_UPLIFT_THRESHOLD
        && agg.mix_reference_pct >= MODERATE_MIX_THRESHOLD
    {
        BranchCategory::Risk
    } else if agg.summary.sales_before_total >= p75_sales {
        BranchCategory::CriticalVolume
    } else {
        BranchCategory::Conservative
    };
    Classification {
        category,
        tone: category.tone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Summary;

    fn agg(uplift: f64, mix: f64, before: f64) -> BranchAgg {
        BranchAgg {
            branch: "Centro".into(),
            summary: Summary {
                sales_before_total: before,
                sales_after_total: before,
                delta_total: 0.0,
                uplift_pct: uplift,
            },
            mix_reference_pct: mix,
            contrib_uplift_pct: 0.0,
            reference_beats_comparator: false,
        }
    }

    #[test]
    fn extreme_concentration_wins_over_risk() {
        // Satisfies both rule 1 (mix >= 50) and rule 2 (uplift >= 8,
        // mix >= 30); rule 1 must win.
        let c = classify_branch(&agg(12.0, 60.0, 1_000_000.0), 10.0);
        assert_eq!(c.category, BranchCategory::ExtremeConcentration);
        assert_eq!(c.tone, Tone::Rose);
    }

    #[test]
    fn high_uplift_with_moderate_mix_is_risk() {
        let c = classify_branch(&agg(9.0, 35.0, 100.0), 1_000_000.0);
        assert_eq!(c.category, BranchCategory::Risk);
    }

    #[test]
    fn high_uplift_alone_is_not_risk() {
        let c = classify_branch(&agg(9.0, 10.0, 100.0), 1_000_000.0);
        assert_eq!(c.category, BranchCategory::Conservative);
    }

    #[test]
    fn large_volume_is_critical() {
        let c = classify_branch(&agg(2.0, 10.0, 500_000.0), 400_000.0);
        assert_eq!(c.category, BranchCategory::CriticalVolume);
        assert_eq!(c.tone, Tone::Emerald);
    }

    #[test]
    fn quiet_branch_is_conservative() {
        let c = classify_branch(&agg(2.0, 10.0, 100.0), 400_000.0);
        assert_eq!(c.category, BranchCategory::Conservative);
        assert_eq!(c.tone, Tone::Slate);
    }

    #[test]
    fn percentile_uses_floor_index() {
        // n = 4: index = floor(0.75 * 3) = 2.
        assert_eq!(percentile_75(&[40.0, 10.0, 30.0, 20.0]), 30.0);
        // n = 5: index = floor(0.75 * 4) = 3.
        assert_eq!(percentile_75(&[50.0, 10.0, 40.0, 30.0, 20.0]), 40.0);
    }

    #[test]
    fn percentile_of_empty_set_is_zero() {
        assert_eq!(percentile_75(&[]), 0.0);
    }
}
