//! End-to-end pipeline scenarios: raw records through assembly, metrics,
//! comparison and health scoring, the way the CLI drives them.

use analytics::{MetricsEngine, metric};
use assembler::AssemblyCache;
use chrono::{NaiveDate, NaiveDateTime};
use configuration::{
    BucketSpec, HealthComponent, HealthWeights, ScoreBands, TopN, WindowSpec,
};
use core_types::{Customer, Order, OrderItem, OrderStatus, Product, RawDataset, Review};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(15, 30, 0)
        .unwrap()
}

fn order(
    id: &str,
    customer: &str,
    status: OrderStatus,
    purchased: NaiveDateTime,
    delivered: Option<NaiveDateTime>,
) -> Order {
    Order {
        order_id: id.into(),
        customer_id: customer.into(),
        status,
        purchased_at: purchased,
        delivered_at: delivered,
    }
}

fn item(order_id: &str, product_id: &str, price: Decimal, freight: Decimal) -> OrderItem {
    OrderItem::new(order_id, product_id, price, freight).unwrap()
}

/// Two delivered orders and one canceled order in March 2018, plus one
/// delivered order in February for comparisons.
fn fixture() -> RawDataset {
    RawDataset::new(
        vec![
            order(
                "o1",
                "c1",
                OrderStatus::Delivered,
                ts(2018, 3, 5),
                Some(ts(2018, 3, 9)),
            ),
            order(
                "o2",
                "c2",
                OrderStatus::Delivered,
                ts(2018, 3, 20),
                Some(ts(2018, 3, 31)),
            ),
            order("o3", "c1", OrderStatus::Canceled, ts(2018, 3, 25), None),
            order(
                "feb",
                "c2",
                OrderStatus::Delivered,
                ts(2018, 2, 10),
                Some(ts(2018, 2, 14)),
            ),
        ],
        vec![
            item("o1", "p1", dec!(100), dec!(10)),
            item("o2", "p2", dec!(50), dec!(5)),
            item("o3", "p1", dec!(200), dec!(0)),
            item("feb", "p2", dec!(40), dec!(4)),
        ],
        vec![
            Product {
                product_id: "p1".into(),
                category: Some("toys".into()),
            },
            Product {
                product_id: "p2".into(),
                category: None,
            },
        ],
        vec![
            Customer {
                customer_id: "c1".into(),
                state: "SP".into(),
                city: "Sao Paulo".into(),
            },
            Customer {
                customer_id: "c2".into(),
                state: "RJ".into(),
                city: "Rio de Janeiro".into(),
            },
        ],
        vec![Review::new("o1", 5).unwrap(), Review::new("feb", 3).unwrap()],
    )
}

fn march() -> WindowSpec {
    WindowSpec::Calendar {
        year: 2018,
        month: Some(3),
    }
}

fn buckets() -> BucketSpec {
    BucketSpec::new(vec![3, 7]).unwrap()
}

fn bands() -> ScoreBands {
    ScoreBands::new(4..=5, 1..=2).unwrap()
}

#[test]
fn end_to_end_revenue_scenario() {
    let raw = fixture();
    let window = march().resolve().unwrap();
    let rows = assembler::assemble(&raw, &window);

    let report = MetricsEngine::new().revenue_metrics(&rows);
    assert_eq!(report.total_revenue, dec!(165));
    assert_eq!(report.order_count, 2);
    assert_eq!(report.average_order_value, Some(dec!(82.5)));

    // The canceled order stays in the table (three rows assembled) but out
    // of the revenue base.
    assert_eq!(rows.len(), 3);
}

#[test]
fn category_table_keeps_the_uncategorized_rows() {
    let raw = fixture();
    let window = march().resolve().unwrap();
    let rows = assembler::assemble(&raw, &window);

    let breakdown = MetricsEngine::new().product_performance(&rows, TopN::new(5).unwrap());
    let labels: Vec<&str> = breakdown.all().map(|e| e.category.as_str()).collect();
    assert_eq!(labels, vec!["toys", "uncategorized"]);

    let share_total: Decimal = breakdown.all().filter_map(|e| e.market_share_pct).sum();
    assert!((share_total - dec!(100)).abs() < dec!(0.0001));
}

#[test]
fn full_comparison_run_against_previous_month() {
    let raw = fixture();
    let engine = MetricsEngine::new();
    let spec = march();

    let window = spec.resolve().unwrap();
    let prev_window = spec.comparison().unwrap();
    let rows = assembler::assemble(&raw, &window);
    let prev_rows = assembler::assemble(&raw, &prev_window);

    let current = engine.metric_set(&rows, window, spec.label(), &buckets(), &bands());
    let previous = engine.metric_set(
        &prev_rows,
        prev_window,
        prev_window.to_string(),
        &buckets(),
        &bands(),
    );

    let comparisons = comparison::compare(&current, &previous);
    let revenue = comparisons
        .iter()
        .find(|c| c.metric == metric::TOTAL_REVENUE)
        .unwrap();
    assert_eq!(revenue.current, Some(dec!(165)));
    assert_eq!(revenue.previous, Some(dec!(44)));
    assert_eq!(revenue.delta, Some(dec!(121)));
    assert_eq!(revenue.growth_pct, Some(dec!(275)));

    let trend = comparison::trend_series(
        &rows,
        &window,
        &prev_rows,
        &prev_window,
        comparison::TrendGranularity::Monthly,
    );
    assert_eq!(trend.current.len(), 1);
    assert_eq!(trend.previous.len(), 1);
    assert_eq!(trend.current[0].value, dec!(165));
    assert_eq!(trend.previous[0].value, dec!(44));
}

#[test]
fn empty_window_flows_through_without_errors() {
    let raw = fixture();
    let spec = WindowSpec::Calendar {
        year: 2016,
        month: None,
    };
    let window = spec.resolve().unwrap();
    let rows = assembler::assemble(&raw, &window);
    assert!(rows.is_empty());

    let engine = MetricsEngine::new();
    let set = engine.metric_set(&rows, window, spec.label(), &buckets(), &bands());
    assert!(set.no_data());
    assert_eq!(set.get(metric::TOTAL_REVENUE), Some(Decimal::ZERO));
    assert_eq!(set.get(metric::ORDER_COUNT), Some(Decimal::ZERO));
    assert_eq!(set.get(metric::AVERAGE_ORDER_VALUE), None);
    assert_eq!(set.get(metric::NPS_ESTIMATE), None);

    // Growth against the empty window is "not computable", not infinite.
    let busy_window = march().resolve().unwrap();
    let busy_rows = assembler::assemble(&raw, &busy_window);
    let busy = engine.metric_set(&busy_rows, busy_window, "2018-03", &buckets(), &bands());
    let comparisons = comparison::compare(&busy, &set);
    let revenue = comparisons
        .iter()
        .find(|c| c.metric == metric::TOTAL_REVENUE)
        .unwrap();
    assert_eq!(revenue.growth_pct, None);
}

#[test]
fn cached_assembly_matches_direct_assembly() {
    let raw = fixture();
    let spec = march();
    let mut cache = AssemblyCache::new();

    let direct = assembler::assemble(&raw, &spec.resolve().unwrap());
    let cached = cache.get_or_assemble(&raw, &spec).unwrap().to_vec();
    let again = cache.get_or_assemble(&raw, &spec).unwrap().to_vec();
    assert_eq!(direct, cached);
    assert_eq!(cached, again);
}

#[test]
fn health_score_over_computed_metrics() {
    let raw = fixture();
    let spec = march();
    let window = spec.resolve().unwrap();
    let rows = assembler::assemble(&raw, &window);
    let set = MetricsEngine::new().metric_set(&rows, window, spec.label(), &buckets(), &bands());

    let weights = HealthWeights::new(
        vec![
            HealthComponent {
                metric: metric::TOTAL_REVENUE.into(),
                weight: dec!(0.5),
                floor: dec!(0),
                ceiling: dec!(330),
            },
            HealthComponent {
                metric: metric::AVERAGE_REVIEW_SCORE.into(),
                weight: dec!(0.5),
                floor: dec!(1),
                ceiling: dec!(5),
            },
        ],
        dec!(1.0),
    )
    .unwrap();

    let report = health::health_score(&set, &weights).unwrap();
    // Revenue 165 of 330 → 0.5; review average 5 → 1.0.
    assert_eq!(report.composite, Some(dec!(0.75)));
}
