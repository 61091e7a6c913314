use std::env;
use std::process;
use std::time::Instant;

use uplift_engine::export::to_csv;
use uplift_engine::filter::apply_filters;
use uplift_engine::loader::{ExportSource, FileExportSource, HttpExportSource};
use uplift_engine::model::{FilterSpec, Selection};
use uplift_engine::rank::{RankMode, SortSpec};
use uplift_engine::snapshot::DashboardSnapshot;

// ---------------------------------------------------------------------------
// Output formatting
// ---------------------------------------------------------------------------

/// Format a money amount with comma thousands separators.
fn format_money(amount: f64) -> String {
    let whole = amount.abs() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };

    if whole < 1_000 {
        return format!("{}${}", sign, whole);
    }

    let s = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}", sign, grouped.chars().rev().collect::<String>())
}

fn format_pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn print_human(snapshot: &DashboardSnapshot, load_ms: u128, compute_ms: u128) {
    println!();
    println!("  \u{2554}{:\u{2550}<62}\u{2557}", "");
    println!("  \u{2551}{:^62}\u{2551}", "PRICING UPLIFT \u{2014} Resumen Ejecutivo");
    println!("  \u{255a}{:\u{2550}<62}\u{255d}", "");
    println!();

    if let Some(ts) = &snapshot.generated_at {
        println!("  Export generado: {ts}");
    }
    println!(
        "  Filtro: sucursal {} \u{00b7} mes {} \u{00b7} canal {} \u{00b7} b\u{00fa}squeda \"{}\"",
        snapshot.filters.branch,
        snapshot.filters.month,
        snapshot.filters.channel,
        snapshot.filters.search.trim()
    );
    println!();

    let kpi = &snapshot.kpi;
    println!(
        "  Venta 2025 {:>12}   Venta 2026 {:>12}   Diferencial {:>10}   Uplift {}",
        format_money(kpi.sales_before_total),
        format_money(kpi.sales_after_total),
        format_money(kpi.delta_total),
        format_pct(kpi.uplift_pct),
    );
    println!();

    if snapshot.channels.is_empty() {
        println!("  Sin datos para el filtro actual.");
        println!();
        return;
    }

    println!("  Por canal");
    println!("  {:\u{2500}<64}", "");
    for agg in &snapshot.channels {
        println!(
            "  {:12} {:>12} {:>12}  uplift {:>7}  contrib {:>7}",
            agg.channel,
            format_money(agg.summary.sales_before_total),
            format_money(agg.summary.delta_total),
            format_pct(agg.summary.uplift_pct),
            format_pct(agg.contribution_pct),
        );
    }
    println!();

    if !snapshot.months.is_empty() {
        println!("  Por mes");
        println!("  {:\u{2500}<64}", "");
        for agg in &snapshot.months {
            println!(
                "  {:12} {:>12} {:>12}  uplift {:>7}",
                agg.month,
                format_money(agg.summary.sales_before_total),
                format_money(agg.summary.delta_total),
                format_pct(agg.summary.uplift_pct),
            );
        }
        println!();
    }

    println!("  Top sucursales");
    println!("  {:\u{2500}<64}", "");
    for (i, entry) in snapshot.ranking.iter().enumerate() {
        let bar_len = (entry.bar_pct / 10.0).round() as usize;
        println!(
            "  {}. {:16} {:>12}  uplift {:>7}  {}",
            i + 1,
            entry.agg.branch,
            format_money(entry.agg.summary.delta_total),
            format_pct(entry.agg.summary.uplift_pct),
            "\u{2588}".repeat(bar_len),
        );
    }
    println!();

    println!("  Sucursales");
    println!("  {:\u{2500}<64}", "");
    for branch in &snapshot.branches {
        println!(
            "  {:16} {:>12}  uplift {:>7}  mix {:>7}  [{}]",
            branch.agg.branch,
            format_money(branch.agg.summary.delta_total),
            format_pct(branch.agg.summary.uplift_pct),
            format_pct(branch.agg.mix_reference_pct),
            branch.label,
        );
    }
    println!();

    if !snapshot.insights.is_empty() {
        println!("  Focos rojos");
        println!("  {:\u{2500}<64}", "");
        for insight in &snapshot.insights {
            println!("  ! {}", insight.title);
            println!("    {}", insight.detail);
        }
        println!();
    }

    println!(
        "  \u{23f1}  Export cargado en {load_ms}ms \u{00b7} C\u{00e1}lculo en {compute_ms}ms \u{00b7} Total {}ms",
        load_ms + compute_ms
    );
    println!();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn usage() -> ! {
    eprintln!("Usage: uplift-server <export.json|URL> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --branch NAME    Filter to one branch");
    eprintln!("  --month NAME     Filter to one month");
    eprintln!("  --channel NAME   Filter to one channel");
    eprintln!("  --search TEXT    Free-text branch search");
    eprintln!("  --top N          Ranking size (default: 5)");
    eprintln!("  --mode MODE      Ranking mode: impact | sensitivity (default: impact)");
    eprintln!("  --csv            Output the filtered rows as CSV");
    eprintln!("  --json           Output the snapshot as JSON");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  uplift-server exports/derived_jan_may_2025_2026.json");
    eprintln!("  uplift-server exports/derived_jan_may_2025_2026.json --channel UBER --json");
    process::exit(1);
}

fn flag_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Error: {flag} requires a value");
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let target = &args[1];
    let mut spec = FilterSpec::default();
    let mut top_n: usize = 5;
    let mut mode = RankMode::Impact;
    let mut csv_output = false;
    let mut json_output = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--branch" => {
                spec = spec.with_branch(Selection::One(flag_value(&args, i, "--branch")));
                i += 2;
            }
            "--month" => {
                spec = spec.with_month(Selection::One(flag_value(&args, i, "--month")));
                i += 2;
            }
            "--channel" => {
                spec = spec.with_channel(Selection::One(flag_value(&args, i, "--channel")));
                i += 2;
            }
            "--search" => {
                spec = spec.with_search(flag_value(&args, i, "--search"));
                i += 2;
            }
            "--top" => {
                top_n = flag_value(&args, i, "--top").parse().unwrap_or_else(|_| {
                    eprintln!("Error: --top requires a positive integer");
                    process::exit(1);
                });
                i += 2;
            }
            "--mode" => {
                mode = match flag_value(&args, i, "--mode").as_str() {
                    "impact" => RankMode::Impact,
                    "sensitivity" => RankMode::Sensitivity,
                    other => {
                        eprintln!("Error: unknown mode '{other}' (use impact or sensitivity)");
                        process::exit(1);
                    }
                };
                i += 2;
            }
            "--csv" => {
                csv_output = true;
                i += 1;
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                usage();
            }
        }
    }

    let source: Box<dyn ExportSource> = if target.starts_with("http://") || target.starts_with("https://") {
        Box::new(HttpExportSource::new(target.clone()))
    } else {
        Box::new(FileExportSource::new(target))
    };

    let load_start = Instant::now();
    let dataset = match source.fetch().await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error loading export: {e}");
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();

    let compute_start = Instant::now();
    let filtered = apply_filters(&dataset.rows, &spec);

    if csv_output {
        match to_csv(&filtered) {
            Ok(csv) => println!("{csv}"),
            Err(e) => {
                eprintln!("Error writing CSV: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let snapshot =
        DashboardSnapshot::build(&dataset, &filtered, &spec, SortSpec::default(), mode, top_n);
    let compute_ms = compute_start.elapsed().as_millis();

    if json_output {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing snapshot: {e}");
                process::exit(1);
            }
        }
    } else {
        print_human(&snapshot, load_ms, compute_ms);
    }
}
