//! Row filtering.
//!
//! A pure predicate over rows driven by an immutable `FilterSpec`, plus a
//! single-entry memo keyed by the composite filter signature. Re-running an
//! unchanged filter returns the previous result object (pointer-equal Arc).

use std::sync::Arc;

use crate::model::{FilterSpec, Row};

/// Does one row pass the spec? Dimension filters match exactly (or are the
/// "All" sentinel); search matches case-insensitively against the branch.
pub fn row_matches(row: &Row, spec: &FilterSpec) -> bool {
    if !spec.branch.matches(&row.branch) {
        return false;
    }
    if !spec.month.matches(&row.month) {
        return false;
    }
    if !spec.channel.matches(&row.channel) {
        return false;
    }
    let q = spec.normalized_search();
    q.is_empty() || row.branch.to_lowercase().contains(&q)
}

/// Filter a row set. Pure, order-preserving, idempotent.
pub fn apply_filters(rows: &[Row], spec: &FilterSpec) -> Vec<Row> {
    rows.iter()
        .filter(|r| row_matches(r, spec))
        .cloned()
        .collect()
}

/// Composite signature of a spec: the four filter values joined with a
/// separator, search case-normalized. Identical specs produce identical
/// keys regardless of how the spec instance was built.
pub fn filter_key(spec: &FilterSpec) -> String {
    format!(
        "{}|{}|{}|{}",
        spec.branch.as_str(),
        spec.month.as_str(),
        spec.channel.as_str(),
        spec.normalized_search()
    )
}

/// Memoizing wrapper around `apply_filters`.
///
/// Holds the last (key, result) pair only; the dataset is small and filters
/// change one field at a time, so a deeper cache buys nothing. Must be
/// invalidated when the underlying row set is replaced.
#[derive(Default)]
pub struct FilterEngine {
    last: Option<(String, Arc<Vec<Row>>)>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered view of `rows` under `spec`. An unchanged key short-circuits
    /// to the cached Arc.
    pub fn filtered(&mut self, rows: &[Row], spec: &FilterSpec) -> Arc<Vec<Row>> {
        let key = filter_key(spec);
        if let Some((cached_key, cached)) = &self.last {
            if *cached_key == key {
                log::debug!("filter cache hit for key {key}");
                return Arc::clone(cached);
            }
        }
        let result = Arc::new(apply_filters(rows, spec));
        self.last = Some((key, Arc::clone(&result)));
        result
    }

    /// Drop the memo. Call when a new dataset is loaded.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Selection;

    fn row(branch: &str, month: &str, channel: &str) -> Row {
        Row {
            branch: branch.into(),
            month: month.into(),
            channel: channel.into(),
            sales_before: 100.0,
            sales_after: 110.0,
            delta: 10.0,
            uplift_pct: 10.0,
        }
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row("Centro", "Enero", "UBER"),
            row("Centro", "Febrero", "MOSTRADOR"),
            row("Norte", "Enero", "UBER"),
            row("Valle Alto", "Mayo", "RAPPI"),
        ]
    }

    #[test]
    fn all_sentinels_pass_everything_in_order() {
        let rows = sample_rows();
        let out = apply_filters(&rows, &FilterSpec::default());
        assert_eq!(out, rows);
    }

    #[test]
    fn dimension_filters_compose() {
        let rows = sample_rows();
        let spec = FilterSpec::default()
            .with_branch(Selection::One("Centro".into()))
            .with_channel(Selection::One("UBER".into()));
        let out = apply_filters(&rows, &spec);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].month, "Enero");
    }

    #[test]
    fn search_matches_branch_case_insensitively() {
        let rows = sample_rows();
        let spec = FilterSpec::default().with_search("  vaLLe ");
        let out = apply_filters(&rows, &spec);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].branch, "Valle Alto");
    }

    #[test]
    fn filtering_is_idempotent() {
        let rows = sample_rows();
        let spec = FilterSpec::default().with_month(Selection::One("Enero".into()));
        let once = apply_filters(&rows, &spec);
        let twice = apply_filters(&once, &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_key_normalizes_search_only() {
        let spec = FilterSpec::default()
            .with_channel(Selection::One("UBER".into()))
            .with_search(" Centro ");
        assert_eq!(filter_key(&spec), "All|All|UBER|centro");
    }

    #[test]
    fn engine_returns_same_arc_for_unchanged_key() {
        let rows = sample_rows();
        let mut engine = FilterEngine::new();
        let spec = FilterSpec::default().with_channel(Selection::One("UBER".into()));
        let first = engine.filtered(&rows, &spec);
        let second = engine.filtered(&rows, &spec);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn engine_recomputes_after_invalidate() {
        let rows = sample_rows();
        let mut engine = FilterEngine::new();
        let spec = FilterSpec::default();
        let first = engine.filtered(&rows, &spec);
        engine.invalidate();
        let second = engine.filtered(&rows, &spec);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn engine_recomputes_for_new_key() {
        let rows = sample_rows();
        let mut engine = FilterEngine::new();
        let first = engine.filtered(&rows, &FilterSpec::default());
        let spec = FilterSpec::default().with_month(Selection::One("Mayo".into()));
        let second = engine.filtered(&rows, &spec);
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 1);
    }
}
