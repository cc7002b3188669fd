use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Revenue metrics over the delivered rows of one window.
///
/// Ratios are `Option<>` because they are undefined for an empty window:
/// an average order value over zero orders is not a number, and reporting
/// it as `0` would be a lie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    /// Sum of price + freight across delivered line items.
    pub total_revenue: Decimal,
    /// Distinct delivered orders. An order with three items counts once.
    pub order_count: usize,
    /// Delivered line items.
    pub items_sold: usize,
    pub average_order_value: Option<Decimal>,
    pub average_item_price: Option<Decimal>,
    pub median_order_value: Option<Decimal>,
    /// Sample standard deviation of per-order totals; needs two orders.
    pub order_value_std_dev: Option<Decimal>,
}

impl RevenueReport {
    /// A zeroed-out report, the correct answer for an empty window.
    pub fn empty() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            order_count: 0,
            items_sold: 0,
            average_order_value: None,
            average_item_price: None,
            median_order_value: None,
            order_value_std_dev: None,
        }
    }
}

/// One row of the ranked category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub revenue: Decimal,
    pub items_sold: usize,
    pub order_count: usize,
    pub average_item_price: Option<Decimal>,
    /// This category's share of delivered revenue, in percent.
    pub market_share_pct: Option<Decimal>,
}

/// The ranked category table: the top-N categories by revenue, with the
/// truncated tail folded into an explicit `"other"` entry so the shares
/// always account for 100% of revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub entries: Vec<CategoryPerformance>,
    /// Aggregate of the categories beyond the top-N cutoff; `None` when
    /// nothing was truncated.
    pub other: Option<CategoryPerformance>,
}

impl CategoryBreakdown {
    /// Label of the fold-in bucket for truncated categories.
    pub const OTHER_LABEL: &'static str = "other";

    /// All entries in rank order, the fold-in bucket last.
    pub fn all(&self) -> impl Iterator<Item = &CategoryPerformance> {
        self.entries.iter().chain(self.other.iter())
    }
}

/// One row of the ranked state table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePerformance {
    pub state: String,
    pub revenue: Decimal,
    pub order_count: usize,
    pub customer_count: usize,
    pub revenue_per_customer: Option<Decimal>,
    pub market_share_pct: Option<Decimal>,
}

/// One caller-defined delivery-time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryBucket {
    /// Display label derived from the bucket boundaries, e.g. "4-7".
    pub label: String,
    /// Delivered line items whose delivery time fell in this bucket.
    pub items: usize,
    /// Average review score of those items' orders, where reviewed.
    pub average_review_score: Option<Decimal>,
}

/// Customer-experience metrics: review scores, the NPS-style estimate, and
/// delivery performance against caller-supplied time buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceReport {
    /// Line items carrying a review score. Unreviewed items are excluded
    /// from every score denominator, never treated as neutral.
    pub review_count: usize,
    pub average_review_score: Option<Decimal>,
    /// Review count per score on the 1-5 scale.
    pub score_distribution: BTreeMap<u8, usize>,
    /// Promoter share minus detractor share, in percentage points, over
    /// reviewed items only. Bands come from configuration.
    pub nps_estimate: Option<Decimal>,
    /// Line items with a recorded delivery.
    pub delivered_items: usize,
    pub average_delivery_days: Option<Decimal>,
    pub median_delivery_days: Option<Decimal>,
    pub delivery_buckets: Vec<DeliveryBucket>,
}
