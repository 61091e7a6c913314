use std::sync::Arc;

use uplift_engine::export::{export_payload, parse_payload, parse_rows, to_csv};
use uplift_engine::filter::{apply_filters, FilterEngine};
use uplift_engine::loader::{ExportSource, FileExportSource};
use uplift_engine::model::{Dataset, FilterSpec, Row, Selection};
use uplift_engine::rank::{RankMode, SortSpec};
use uplift_engine::snapshot::DashboardSnapshot;
use uplift_engine::{branch_rollup, channel_rollup, summarize};

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

/// A realistic export covering three branches, two channels and the whole
/// Jan–May window, in the export job's legacy field names.
const SAMPLE_EXPORT: &str = r#"{
  "meta": { "generated_at": "2026-05-31T18:04:22.123456+00:00", "source": "derived_jan_may_2025_2026" },
  "rows": [
    { "sucursal": "Centro", "mes": "Enero", "canal": "UBER",      "venta_2025": 1000, "venta_2026": 1120, "diferencial": 120, "uplift_pct": 12.0 },
    { "sucursal": "Centro", "mes": "Enero", "canal": "MOSTRADOR", "venta_2025": 3000, "venta_2026": 3090, "diferencial": 90,  "uplift_pct": 3.0 },
    { "sucursal": "Centro", "mes": "Mayo",  "canal": "UBER",      "venta_2025": 1200, "venta_2026": 1380, "diferencial": 180, "uplift_pct": 15.0 },
    { "sucursal": "Norte",  "mes": "Enero", "canal": "UBER",      "venta_2025": 2500, "venta_2026": 2625, "diferencial": 125, "uplift_pct": 5.0 },
    { "sucursal": "Norte",  "mes": "Mayo",  "canal": "MOSTRADOR", "venta_2025": 1800, "venta_2026": 1854, "diferencial": 54,  "uplift_pct": 3.0 },
    { "sucursal": "Valle",  "mes": "Marzo", "canal": "MOSTRADOR", "venta_2025": 900,  "venta_2026": 927,  "diferencial": 27,  "uplift_pct": 3.0 },
    { "sucursal": "Valle",  "mes": "Junio", "canal": "MOSTRADOR", "venta_2025": 400,  "venta_2026": 408,  "diferencial": 8,   "uplift_pct": 2.0 }
  ],
  "sucursales": [
    { "sucursal": "Centro", "venta_2025": 5200, "diferencial": 390, "uplift_pct": 7.5, "mix_uber_2025": 42.3, "contrib_uplift_pct": 64.6 },
    { "sucursal": "Norte",  "venta_2025": 4300, "diferencial": 179, "uplift_pct": 4.2, "mix_uber_2025": 58.1, "contrib_uplift_pct": 29.6 }
  ],
  "scatter": { "median_mix_uber": 50.2, "median_uplift": 5.85, "corr_mix_uber_uplift": 0.62 },
  "drilldown": [
    { "mes": "Enero", "canal": "UBER", "sucursal": "Centro", "venta_2025": 1000, "diferencial": 120, "uplift_pct": 12.0 }
  ]
}"#;

fn sample_dataset() -> Dataset {
    serde_json::from_str(SAMPLE_EXPORT).expect("fixture must parse")
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_source_loads_the_sample_export() {
    let path = std::env::temp_dir().join("uplift_engine_integration_export.json");
    std::fs::write(&path, SAMPLE_EXPORT).unwrap();

    let dataset = FileExportSource::new(&path).fetch().await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(dataset.rows.len(), 7);
    assert_eq!(dataset.branches.len(), 2);
    assert_eq!(dataset.drilldown.len(), 1);
    assert!((dataset.scatter.corr_mix_uplift - 0.62).abs() < 0.01);
    // Legacy field names land on the canonical model.
    assert_eq!(dataset.rows[0].branch, "Centro");
    assert_eq!(dataset.rows[0].channel, "UBER");
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

#[test]
fn all_sentinel_filters_return_the_input_unchanged() {
    let ds = sample_dataset();
    let out = apply_filters(&ds.rows, &FilterSpec::default());
    assert_eq!(out, ds.rows);
}

#[test]
fn filtering_twice_equals_filtering_once() {
    let ds = sample_dataset();
    let spec = FilterSpec::default()
        .with_channel(Selection::One("UBER".into()))
        .with_search("cen");
    let once = apply_filters(&ds.rows, &spec);
    let twice = apply_filters(&once, &spec);
    assert_eq!(once, twice);
}

#[test]
fn memo_cache_returns_the_previous_result_object() {
    let ds = sample_dataset();
    let mut engine = FilterEngine::new();
    let spec = FilterSpec::default().with_month(Selection::One("Mayo".into()));
    let first = engine.filtered(&ds.rows, &spec);
    let second = engine.filtered(&ds.rows, &spec);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 2);
}

// ---------------------------------------------------------------------------
// Aggregation properties
// ---------------------------------------------------------------------------

#[test]
fn summary_delta_equals_sum_of_row_deltas() {
    let ds = sample_dataset();
    let expected: f64 = ds.rows.iter().map(|r| r.delta).sum();
    assert!((summarize(&ds.rows).delta_total - expected).abs() < 1e-9);
}

#[test]
fn zero_volume_group_has_exactly_zero_uplift() {
    let rows: Vec<Row> = Vec::new();
    assert_eq!(summarize(&rows).uplift_pct, 0.0);
}

#[test]
fn channel_contributions_sum_to_100_for_nonzero_totals() {
    let ds = sample_dataset();
    let total: f64 = channel_rollup(&ds.rows)
        .iter()
        .map(|a| a.contribution_pct)
        .sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn contribution_is_relative_to_the_filtered_set() {
    let ds = sample_dataset();
    let spec = FilterSpec::default().with_branch(Selection::One("Centro".into()));
    let filtered = apply_filters(&ds.rows, &spec);
    // Within Centro only: UBER moves 300 of 390.
    let aggs = channel_rollup(&filtered);
    let uber = aggs.iter().find(|a| a.channel == "UBER").unwrap();
    assert!((uber.contribution_pct - (300.0 / 390.0 * 100.0)).abs() < 1e-9);
}

#[test]
fn branch_aggregates_match_hand_computed_values() {
    let ds = sample_dataset();
    let aggs = branch_rollup(&ds.rows);
    let centro = aggs.iter().find(|a| a.branch == "Centro").unwrap();

    // 1000 + 3000 + 1200 before, 120 + 90 + 180 delta.
    assert!((centro.summary.sales_before_total - 5200.0).abs() < 0.01);
    assert!((centro.summary.delta_total - 390.0).abs() < 0.01);
    // UBER share of before-sales: 2200 / 5200.
    assert!((centro.mix_reference_pct - (2200.0 / 5200.0 * 100.0)).abs() < 1e-9);
    // UBER uplift 300/2200 beats MOSTRADOR 90/3000.
    assert!(centro.reference_beats_comparator);

    // Valle has no UBER rows: the flag is a concrete false.
    let valle = aggs.iter().find(|a| a.branch == "Valle").unwrap();
    assert!(!valle.reference_beats_comparator);
    assert_eq!(valle.mix_reference_pct, 0.0);
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn snapshot_covers_every_view_over_the_full_set() {
    let ds = sample_dataset();
    let spec = FilterSpec::default();
    let snap = DashboardSnapshot::build(
        &ds,
        &ds.rows,
        &spec,
        SortSpec::default(),
        RankMode::Impact,
        10,
    );

    assert_eq!(snap.channels.len(), 2);
    // Junio is outside the canonical window: monthly view shows
    // Enero, Marzo, Mayo only.
    let months: Vec<&str> = snap.months.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["Enero", "Marzo", "Mayo"]);
    // But Junio still counts toward the KPI totals.
    let expected: f64 = ds.rows.iter().map(|r| r.delta).sum();
    assert!((snap.kpi.delta_total - expected).abs() < 1e-9);

    assert_eq!(snap.branches.len(), 3);
    assert_eq!(snap.drilldown_rows, 1);
    assert_eq!(snap.scatter_branches.len(), 2);
    assert!(snap.generated_at.is_some());
    // Every branch carries exactly one category label.
    assert!(snap.branches.iter().all(|b| !b.label.is_empty()));
}

#[test]
fn snapshot_ranking_respects_top_n_and_mode() {
    let ds = sample_dataset();
    let spec = FilterSpec::default();
    let snap = DashboardSnapshot::build(
        &ds,
        &ds.rows,
        &spec,
        SortSpec::default(),
        RankMode::Impact,
        2,
    );
    assert_eq!(snap.ranking.len(), 2);
    // Centro (390) ahead of Norte (179).
    assert_eq!(snap.ranking[0].agg.branch, "Centro");
    assert!((snap.ranking[0].bar_pct - 100.0).abs() < 1e-9);
    assert!(snap.ranking[1].bar_pct < 100.0);
}

#[test]
fn empty_filter_produces_a_safe_snapshot() {
    let ds = sample_dataset();
    let spec = FilterSpec::default().with_branch(Selection::One("Nadie".into()));
    let filtered = apply_filters(&ds.rows, &spec);
    let snap = DashboardSnapshot::build(
        &ds,
        &filtered,
        &spec,
        SortSpec::default(),
        RankMode::Sensitivity,
        5,
    );
    assert_eq!(snap.kpi.uplift_pct, 0.0);
    assert!(snap.channels.is_empty());
    assert!(snap.months.is_empty());
    assert!(snap.insights.is_empty());
}

// ---------------------------------------------------------------------------
// Export round-trips
// ---------------------------------------------------------------------------

#[test]
fn json_export_round_trips_the_filtered_rows() {
    let ds = sample_dataset();
    let spec = FilterSpec::default().with_channel(Selection::One("UBER".into()));
    let filtered = apply_filters(&ds.rows, &spec);

    let json = export_payload(&ds.meta, &spec, &filtered).unwrap();
    let back = parse_payload(&json).unwrap();

    assert_eq!(back.rows, filtered);
    assert_eq!(back.filters, spec);
    // Unknown meta keys survive the trip.
    assert_eq!(
        back.meta.extra.get("source").and_then(|v| v.as_str()),
        Some("derived_jan_may_2025_2026")
    );
}

#[test]
fn serialized_rows_reparse_without_precision_loss() {
    let ds = sample_dataset();
    let json = serde_json::to_string(&ds.rows).unwrap();
    let back: Vec<Row> = parse_rows(&json).unwrap();
    assert_eq!(back, ds.rows);
}

#[test]
fn csv_export_covers_the_filtered_rows() {
    let ds = sample_dataset();
    let spec = FilterSpec::default().with_month(Selection::One("Enero".into()));
    let filtered = apply_filters(&ds.rows, &spec);

    let csv = to_csv(&filtered).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "branch,month,channel,sales_before,sales_after,delta,uplift_pct"
    );
    assert_eq!(lines.count(), filtered.len());
}
