use crate::metric;
use crate::report::{
    CategoryBreakdown, CategoryPerformance, DeliveryBucket, ExperienceReport, RevenueReport,
    StatePerformance,
};
use configuration::{BucketSpec, ScoreBands, TopN};
use core_types::{AnalysisRow, DateRange, MetricSet};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A stateless calculator deriving business metrics from an assembled
/// analysis table. Every method is a pure function of its inputs.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revenue metrics over the delivered rows of the table.
    ///
    /// The order count is over *distinct* order ids — an order with three
    /// line items contributes three rows but one order.
    pub fn revenue_metrics(&self, rows: &[AnalysisRow]) -> RevenueReport {
        let mut report = RevenueReport::empty();
        let mut order_totals: HashMap<&str, Decimal> = HashMap::new();
        let mut price_sum = Decimal::ZERO;

        for row in rows.iter().filter(|r| r.status.is_delivered()) {
            let revenue = row.revenue();
            report.total_revenue += revenue;
            report.items_sold += 1;
            price_sum += row.price;
            *order_totals.entry(row.order_id.as_str()).or_default() += revenue;
        }

        report.order_count = order_totals.len();
        if report.order_count > 0 {
            report.average_order_value =
                Some(report.total_revenue / Decimal::from(report.order_count));
        }
        if report.items_sold > 0 {
            report.average_item_price = Some(price_sum / Decimal::from(report.items_sold));
        }

        let totals: Vec<Decimal> = order_totals.into_values().collect();
        report.median_order_value = median(totals.clone());
        report.order_value_std_dev = sample_std_dev(&totals);

        report
    }

    /// Per-category performance over delivered rows, ranked by revenue.
    ///
    /// Categories beyond the top-N cutoff are folded into one `"other"`
    /// entry rather than silently dropped, so the market shares of the
    /// returned table always sum to 100% of delivered revenue.
    pub fn product_performance(&self, rows: &[AnalysisRow], top_n: TopN) -> CategoryBreakdown {
        let groups = group_delivered(rows, |row| row.category.as_str());
        let total_revenue: Decimal = groups.values().map(|g| g.revenue).sum();

        let mut ranked: Vec<CategoryPerformance> = groups
            .into_iter()
            .map(|(category, g)| CategoryPerformance {
                category: category.to_string(),
                revenue: g.revenue,
                items_sold: g.items,
                order_count: g.orders.len(),
                average_item_price: g.average_item_price(),
                market_share_pct: share_pct(g.revenue, total_revenue),
            })
            .collect();
        // Revenue descending, then category name for a stable order.
        ranked.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.category.cmp(&b.category))
        });

        if ranked.len() <= top_n.get() {
            return CategoryBreakdown {
                entries: ranked,
                other: None,
            };
        }

        let tail = ranked.split_off(top_n.get());
        let mut other_revenue = Decimal::ZERO;
        let mut other_items = 0usize;
        let mut other_orders = 0usize;
        let mut other_share = Decimal::ZERO;
        for entry in &tail {
            other_revenue += entry.revenue;
            other_items += entry.items_sold;
            // Orders can span categories, so this is an upper bound; it is
            // reported as the fold of the per-category counts.
            other_orders += entry.order_count;
            if let Some(share) = entry.market_share_pct {
                other_share += share;
            }
        }
        // The fold's share is the sum of the folded shares, so the table
        // accounts for exactly the same 100% as the untruncated ranking.
        let other = CategoryPerformance {
            category: CategoryBreakdown::OTHER_LABEL.to_string(),
            revenue: other_revenue,
            items_sold: other_items,
            order_count: other_orders,
            average_item_price: None,
            market_share_pct: if total_revenue > Decimal::ZERO {
                Some(other_share)
            } else {
                None
            },
        };

        CategoryBreakdown {
            entries: ranked,
            other: Some(other),
        }
    }

    /// Per-state performance over delivered rows, ranked by revenue.
    pub fn geographic_distribution(&self, rows: &[AnalysisRow]) -> Vec<StatePerformance> {
        let groups = group_delivered(rows, |row| row.customer_state.as_str());
        let total_revenue: Decimal = groups.values().map(|g| g.revenue).sum();

        let mut ranked: Vec<StatePerformance> = groups
            .into_iter()
            .map(|(state, g)| {
                let customer_count = g.customers.len();
                // A non-empty group always has a customer, but the guard
                // keeps a dirty group from turning into a division error.
                let revenue_per_customer = if customer_count > 0 {
                    Some(g.revenue / Decimal::from(customer_count))
                } else {
                    None
                };
                StatePerformance {
                    state: state.to_string(),
                    revenue: g.revenue,
                    order_count: g.orders.len(),
                    customer_count,
                    revenue_per_customer,
                    market_share_pct: share_pct(g.revenue, total_revenue),
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.state.cmp(&b.state)));
        ranked
    }

    /// Review and delivery metrics.
    ///
    /// Review averages are over reviewed rows only — a missing review is
    /// excluded from the denominator, never counted as a neutral score.
    /// Delivery-time buckets and promoter/detractor bands are supplied by
    /// the caller; nothing here is hardcoded.
    pub fn customer_experience(
        &self,
        rows: &[AnalysisRow],
        buckets: &BucketSpec,
        bands: &ScoreBands,
    ) -> ExperienceReport {
        let mut score_sum = 0u64;
        let mut review_count = 0usize;
        let mut promoters = 0usize;
        let mut detractors = 0usize;
        let mut score_distribution: BTreeMap<u8, usize> = BTreeMap::new();

        for row in rows {
            let Some(score) = row.review_score else {
                continue;
            };
            review_count += 1;
            score_sum += score as u64;
            *score_distribution.entry(score).or_default() += 1;
            if bands.is_promoter(score) {
                promoters += 1;
            } else if bands.is_detractor(score) {
                detractors += 1;
            }
        }

        let average_review_score = if review_count > 0 {
            Some(Decimal::from(score_sum) / Decimal::from(review_count))
        } else {
            None
        };
        let nps_estimate = if review_count > 0 {
            let total = Decimal::from(review_count);
            let promoter_pct = Decimal::from(promoters) / total * Decimal::from(100);
            let detractor_pct = Decimal::from(detractors) / total * Decimal::from(100);
            Some(promoter_pct - detractor_pct)
        } else {
            None
        };

        // Delivery performance, over rows that actually arrived.
        let labels = buckets.labels();
        let mut bucket_items = vec![0usize; buckets.bucket_count()];
        let mut bucket_score_sums = vec![0u64; buckets.bucket_count()];
        let mut bucket_review_counts = vec![0usize; buckets.bucket_count()];
        let mut delivery_days: Vec<i64> = Vec::new();

        for row in rows {
            let Some(days) = row.delivery_days() else {
                continue;
            };
            delivery_days.push(days);
            let idx = buckets.index_for(days);
            bucket_items[idx] += 1;
            if let Some(score) = row.review_score {
                bucket_score_sums[idx] += score as u64;
                bucket_review_counts[idx] += 1;
            }
        }

        let delivered_items = delivery_days.len();
        let average_delivery_days = if delivered_items > 0 {
            let sum: i64 = delivery_days.iter().sum();
            Some(Decimal::from(sum) / Decimal::from(delivered_items))
        } else {
            None
        };
        let median_delivery_days = median(delivery_days.iter().map(|d| Decimal::from(*d)).collect());

        let delivery_buckets = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| DeliveryBucket {
                label,
                items: bucket_items[i],
                average_review_score: if bucket_review_counts[i] > 0 {
                    Some(
                        Decimal::from(bucket_score_sums[i])
                            / Decimal::from(bucket_review_counts[i]),
                    )
                } else {
                    None
                },
            })
            .collect();

        ExperienceReport {
            review_count,
            average_review_score,
            score_distribution,
            nps_estimate,
            delivered_items,
            average_delivery_days,
            median_delivery_days,
            delivery_buckets,
        }
    }

    /// Flattens the scalar metrics of one window into a window-tagged
    /// [`MetricSet`] for comparison and health scoring. Counts are zero for
    /// an empty window; ratios stay `None`.
    pub fn metric_set(
        &self,
        rows: &[AnalysisRow],
        window: DateRange,
        label: impl Into<String>,
        buckets: &BucketSpec,
        bands: &ScoreBands,
    ) -> MetricSet {
        let revenue = self.revenue_metrics(rows);
        let experience = self.customer_experience(rows, buckets, bands);

        let mut set = MetricSet::new(window, label, rows.len());
        set.insert(metric::TOTAL_REVENUE, Some(revenue.total_revenue));
        set.insert(metric::ORDER_COUNT, Some(Decimal::from(revenue.order_count)));
        set.insert(metric::ITEMS_SOLD, Some(Decimal::from(revenue.items_sold)));
        set.insert(metric::AVERAGE_ORDER_VALUE, revenue.average_order_value);
        set.insert(metric::AVERAGE_ITEM_PRICE, revenue.average_item_price);
        set.insert(metric::MEDIAN_ORDER_VALUE, revenue.median_order_value);
        set.insert(metric::ORDER_VALUE_STD_DEV, revenue.order_value_std_dev);
        set.insert(
            metric::REVIEW_COUNT,
            Some(Decimal::from(experience.review_count)),
        );
        set.insert(
            metric::AVERAGE_REVIEW_SCORE,
            experience.average_review_score,
        );
        set.insert(metric::NPS_ESTIMATE, experience.nps_estimate);
        set.insert(
            metric::AVERAGE_DELIVERY_DAYS,
            experience.average_delivery_days,
        );
        set.insert(
            metric::MEDIAN_DELIVERY_DAYS,
            experience.median_delivery_days,
        );
        set
    }
}

/// Shared accumulator for the grouped (category/state) breakdowns.
#[derive(Default)]
struct GroupAggregate<'a> {
    revenue: Decimal,
    items: usize,
    price_sum: Decimal,
    orders: HashSet<&'a str>,
    customers: HashSet<&'a str>,
}

impl GroupAggregate<'_> {
    fn average_item_price(&self) -> Option<Decimal> {
        if self.items > 0 {
            Some(self.price_sum / Decimal::from(self.items))
        } else {
            None
        }
    }
}

fn group_delivered<'a, K: Eq + std::hash::Hash>(
    rows: &'a [AnalysisRow],
    key: impl Fn(&'a AnalysisRow) -> K,
) -> HashMap<K, GroupAggregate<'a>> {
    let mut groups: HashMap<K, GroupAggregate<'a>> = HashMap::new();
    for row in rows.iter().filter(|r| r.status.is_delivered()) {
        let g = groups.entry(key(row)).or_default();
        g.revenue += row.revenue();
        g.items += 1;
        g.price_sum += row.price;
        g.orders.insert(row.order_id.as_str());
        g.customers.insert(row.customer_id.as_str());
    }
    groups
}

fn share_pct(part: Decimal, total: Decimal) -> Option<Decimal> {
    if total > Decimal::ZERO {
        Some(part / total * Decimal::from(100))
    } else {
        None
    }
}

fn median(mut values: Vec<Decimal>) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / Decimal::from(2))
    }
}

/// Sample standard deviation; undefined below two observations.
fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let n = Decimal::from(values.len());
    let mean = values.iter().sum::<Decimal>() / n;
    let variance = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    variance.sqrt()
}
