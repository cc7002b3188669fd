use analytics::{CategoryBreakdown, MetricsEngine, StatePerformance};
use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use comparison::{MetricComparison, TrendGranularity, TrendPair};
use configuration::{AnalysisSettings, WindowSpec};
use core_types::MetricSet;
use health::HealthReport;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian analytics application.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => handle_report(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Business-performance metrics for e-commerce transaction data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the metrics report for one analysis window.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ReportArgs {
    /// Directory containing the raw CSV record sets.
    #[arg(long)]
    data_dir: PathBuf,

    /// TOML file with the analysis settings (buckets, bands, weights, top-N).
    #[arg(long)]
    settings: PathBuf,

    /// Calendar year to analyze (combine with --month for a single month).
    #[arg(long, conflicts_with_all = ["from", "to"])]
    year: Option<i32>,

    /// Calendar month within --year (1-12).
    #[arg(long, requires = "year")]
    month: Option<u32>,

    /// Explicit window start (YYYY-MM-DD), inclusive. Requires --to.
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Explicit window end (YYYY-MM-DD), inclusive.
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Also compute the preceding window and period-over-period growth.
    #[arg(long)]
    compare: bool,

    /// Emit one JSON document instead of terminal tables.
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn window_spec(&self) -> anyhow::Result<WindowSpec> {
        match (self.year, self.from, self.to) {
            (Some(year), None, None) => Ok(WindowSpec::Calendar {
                year,
                month: self.month,
            }),
            (None, Some(start), Some(end)) => Ok(WindowSpec::Range { start, end }),
            (None, None, None) => bail!("select a window with --year [--month] or --from/--to"),
            _ => bail!("--year and --from/--to are mutually exclusive"),
        }
    }
}

// ==============================================================================
// Report Command Logic
// ==============================================================================

/// The full JSON document emitted with --json, mirroring what the tables show.
#[derive(Serialize)]
struct ReportDocument {
    window: String,
    metrics: MetricSet,
    categories: CategoryBreakdown,
    states: Vec<StatePerformance>,
    delivery_buckets: Vec<analytics::DeliveryBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Vec<MetricComparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend: Option<TrendPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthReport>,
}

fn handle_report(args: ReportArgs) -> anyhow::Result<()> {
    let settings = AnalysisSettings::load(&args.settings)
        .with_context(|| format!("loading settings from {}", args.settings.display()))?;
    let spec = args.window_spec()?;
    let window = spec.resolve()?;

    let raw = loader::load_dir(&args.data_dir)
        .with_context(|| format!("loading raw data from {}", args.data_dir.display()))?;
    let rows = assembler::assemble(&raw, &window);

    let engine = MetricsEngine::new();
    let metrics = engine.metric_set(
        &rows,
        window,
        spec.label(),
        &settings.delivery_buckets,
        &settings.score_bands,
    );
    let categories = engine.product_performance(&rows, settings.top_n);
    let states = engine.geographic_distribution(&rows);
    let experience =
        engine.customer_experience(&rows, &settings.delivery_buckets, &settings.score_bands);

    let (comparison_table, trend) = if args.compare {
        let prev_window = spec.comparison()?;
        let prev_rows = assembler::assemble(&raw, &prev_window);
        let prev_metrics = engine.metric_set(
            &prev_rows,
            prev_window,
            prev_window.to_string(),
            &settings.delivery_buckets,
            &settings.score_bands,
        );
        let table = comparison::compare(&metrics, &prev_metrics);
        let trend = comparison::trend_series(
            &rows,
            &window,
            &prev_rows,
            &prev_window,
            TrendGranularity::Monthly,
        );
        (Some(table), Some(trend))
    } else {
        (None, None)
    };

    let health = settings
        .health
        .as_ref()
        .map(|weights| health::health_score(&metrics, weights))
        .transpose()?;

    if args.json {
        let document = ReportDocument {
            window: metrics.label.clone(),
            metrics,
            categories,
            states,
            delivery_buckets: experience.delivery_buckets,
            comparison: comparison_table,
            trend,
            health,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    render_report(
        &metrics,
        &categories,
        &states,
        &experience.delivery_buckets,
        comparison_table.as_deref(),
        trend.as_ref(),
        health.as_ref(),
    );
    Ok(())
}

// ==============================================================================
// Terminal Rendering
// ==============================================================================

fn render_report(
    metrics: &MetricSet,
    categories: &CategoryBreakdown,
    states: &[StatePerformance],
    delivery_buckets: &[analytics::DeliveryBucket],
    comparison_table: Option<&[MetricComparison]>,
    trend: Option<&TrendPair>,
    health: Option<&HealthReport>,
) {
    println!("Window: {} ({})", metrics.label, metrics.window);
    if metrics.no_data() {
        println!("No data in window.");
    }

    let mut summary = Table::new();
    summary.set_header(["Metric", "Value"]);
    for (name, value) in &metrics.values {
        summary.add_row([name.clone(), fmt_opt(*value)]);
    }
    println!("\nSummary\n{summary}");

    if !metrics.no_data() {
        let mut table = Table::new();
        table.set_header(["Category", "Revenue", "Items", "Orders", "Share %"]);
        for entry in categories.all() {
            table.add_row([
                entry.category.clone(),
                fmt_decimal(entry.revenue),
                entry.items_sold.to_string(),
                entry.order_count.to_string(),
                fmt_opt(entry.market_share_pct),
            ]);
        }
        println!("\nTop categories\n{table}");

        let mut table = Table::new();
        table.set_header(["State", "Revenue", "Orders", "Customers", "Rev/Customer", "Share %"]);
        for state in states {
            table.add_row([
                state.state.clone(),
                fmt_decimal(state.revenue),
                state.order_count.to_string(),
                state.customer_count.to_string(),
                fmt_opt(state.revenue_per_customer),
                fmt_opt(state.market_share_pct),
            ]);
        }
        println!("\nStates\n{table}");

        let mut table = Table::new();
        table.set_header(["Delivery days", "Items", "Avg review"]);
        for bucket in delivery_buckets {
            table.add_row([
                bucket.label.clone(),
                bucket.items.to_string(),
                fmt_opt(bucket.average_review_score),
            ]);
        }
        println!("\nDelivery performance\n{table}");
    }

    if let Some(rows) = comparison_table {
        let mut table = Table::new();
        table.set_header(["Metric", "Current", "Previous", "Delta", "Growth %"]);
        for row in rows {
            table.add_row([
                row.metric.clone(),
                fmt_opt(row.current),
                fmt_opt(row.previous),
                fmt_opt(row.delta),
                fmt_opt(row.growth_pct),
            ]);
        }
        println!("\nPeriod over period\n{table}");
    }

    if let Some(pair) = trend {
        let mut table = Table::new();
        table.set_header(["Bucket", "Current", "Prev bucket", "Previous"]);
        for (cur, prev) in pair.current.iter().zip(pair.previous.iter()) {
            table.add_row([
                cur.label.clone(),
                fmt_decimal(cur.value),
                prev.label.clone(),
                fmt_decimal(prev.value),
            ]);
        }
        println!("\nRevenue trend\n{table}");
    }

    if let Some(report) = health {
        let mut table = Table::new();
        table.set_header(["Component", "Weight", "Raw", "Normalized", "Weighted"]);
        for c in &report.components {
            table.add_row([
                c.metric.clone(),
                fmt_decimal(c.weight),
                fmt_opt(c.raw),
                fmt_opt(c.normalized),
                fmt_opt(c.weighted),
            ]);
        }
        println!("\nBusiness health\n{table}");
        match report.composite {
            Some(score) => println!("Composite score: {}", fmt_decimal(score)),
            None => println!(
                "Composite score: n/a (undefined components: {})",
                report.undefined.join(", ")
            ),
        }
    }
}

fn fmt_decimal(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map(fmt_decimal).unwrap_or_else(|| "n/a".to_string())
}
