use crate::enums::OrderStatus;
use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One order header from the orders dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchased_at: NaiveDateTime,
    /// Absent while the order is still in flight (or never arrived).
    pub delivered_at: Option<NaiveDateTime>,
}

/// One line item of an order. Orders commonly carry several of these;
/// revenue per order is the sum of `price + freight` across its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub product_id: String,
    pub price: Decimal,
    pub freight: Decimal,
}

impl OrderItem {
    /// Builds an order item, rejecting negative monetary amounts.
    pub fn new(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        price: Decimal,
        freight: Decimal,
    ) -> Result<Self, CoreError> {
        let order_id = order_id.into();
        if price.is_sign_negative() {
            return Err(CoreError::NegativeAmount {
                field: "price",
                value: price,
                order_id,
            });
        }
        if freight.is_sign_negative() {
            return Err(CoreError::NegativeAmount {
                field: "freight",
                value: freight,
                order_id,
            });
        }
        Ok(Self {
            order_id,
            product_id: product_id.into(),
            price,
            freight,
        })
    }
}

/// A catalog product. The category label is optional in the raw data;
/// downstream it is rendered as [`AnalysisRow::UNCATEGORIZED`] rather than
/// being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub state: String,
    pub city: String,
}

/// A customer review for one order. Zero-or-one per order is the common
/// case; absence is a valid state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub order_id: String,
    pub score: u8,
}

impl Review {
    /// The closed score scale of the raw data contract.
    pub const MIN_SCORE: u8 = 1;
    pub const MAX_SCORE: u8 = 5;

    /// Builds a review, rejecting scores outside the 1-5 scale.
    pub fn new(order_id: impl Into<String>, score: i64) -> Result<Self, CoreError> {
        if score < Self::MIN_SCORE as i64 || score > Self::MAX_SCORE as i64 {
            return Err(CoreError::ScoreOutOfRange(score));
        }
        Ok(Self {
            order_id: order_id.into(),
            score: score as u8,
        })
    }
}

/// The five raw record sets of one analysis run, loaded once and treated
/// as immutable for the run's duration.
///
/// The `version` fingerprint changes whenever the underlying records do,
/// which is what the assembly cache uses to detect a reload.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub reviews: Vec<Review>,
    version: u64,
}

impl RawDataset {
    pub fn new(
        orders: Vec<Order>,
        order_items: Vec<OrderItem>,
        products: Vec<Product>,
        customers: Vec<Customer>,
        reviews: Vec<Review>,
    ) -> Self {
        let version = fingerprint(&orders, &order_items, &products, &customers, &reviews);
        Self {
            orders,
            order_items,
            products,
            customers,
            reviews,
            version,
        }
    }

    /// A cheap content fingerprint of the loaded records. Two datasets with
    /// the same records share a version; a reload that changed anything
    /// yields a new one.
    pub fn version(&self) -> u64 {
        self.version
    }
}

fn fingerprint(
    orders: &[Order],
    items: &[OrderItem],
    products: &[Product],
    customers: &[Customer],
    reviews: &[Review],
) -> u64 {
    let mut h = DefaultHasher::new();
    orders.len().hash(&mut h);
    items.len().hash(&mut h);
    products.len().hash(&mut h);
    customers.len().hash(&mut h);
    reviews.len().hash(&mut h);
    for o in orders {
        o.order_id.hash(&mut h);
        o.purchased_at.hash(&mut h);
    }
    for i in items {
        i.order_id.hash(&mut h);
        i.product_id.hash(&mut h);
        i.price.hash(&mut h);
        i.freight.hash(&mut h);
    }
    for r in reviews {
        r.order_id.hash(&mut h);
        r.score.hash(&mut h);
    }
    h.finish()
}

/// One denormalized record: a single order item enriched with everything
/// metric computation needs. Produced exclusively by the dataset assembler;
/// the metrics engine never touches the raw record sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub order_id: String,
    pub status: OrderStatus,
    pub purchased_at: NaiveDateTime,
    pub delivered_at: Option<NaiveDateTime>,
    pub price: Decimal,
    pub freight: Decimal,
    /// Category label with the missing case already substituted by
    /// [`AnalysisRow::UNCATEGORIZED`].
    pub category: String,
    pub customer_id: String,
    pub customer_state: String,
    pub customer_city: String,
    pub review_score: Option<u8>,
}

impl AnalysisRow {
    /// Label substituted for products with no category. Such rows are kept,
    /// never silently dropped.
    pub const UNCATEGORIZED: &'static str = "uncategorized";

    /// Revenue contribution of this line item.
    pub fn revenue(&self) -> Decimal {
        self.price + self.freight
    }

    /// Whole days between purchase and delivery, when the order arrived.
    pub fn delivery_days(&self) -> Option<i64> {
        self.delivered_at
            .map(|d| (d - self.purchased_at).num_days())
    }
}

/// An inclusive date range, the normalized form of every window
/// specification. Hashable so it can key the assembly cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered, inclusive of both bounds.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether a purchase timestamp falls inside the window.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let d = ts.date();
        self.start <= d && d <= self.end
    }

    /// The adjacent preceding range of equal day-length, e.g. the default
    /// comparison window for an explicit range. `None` only when the range
    /// would fall off the calendar entirely.
    pub fn previous(&self) -> Option<DateRange> {
        let len = self.days();
        if len < 1 {
            return None;
        }
        let end = self.start.pred_opt()?;
        let start = end.checked_sub_days(chrono::Days::new(len as u64 - 1))?;
        Some(DateRange { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// The flattened, window-tagged output of one metrics run: metric name to
/// value, where `None` marks a value that is undefined for this window
/// (zero denominator, no reviews, ...), as opposed to a true zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub window: DateRange,
    /// Human-readable period label, e.g. "2018" or "2018-03".
    pub label: String,
    /// Number of analysis rows the set was computed from. Zero is the
    /// explicit "no data in window" marker.
    pub row_count: usize,
    pub values: BTreeMap<String, Option<Decimal>>,
}

impl MetricSet {
    pub fn new(window: DateRange, label: impl Into<String>, row_count: usize) -> Self {
        Self {
            window,
            label: label.into(),
            row_count,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Decimal>) {
        self.values.insert(name.into(), value);
    }

    /// The value of a metric, flattened: `None` covers both "metric not in
    /// this set" and "metric undefined for this window". Use
    /// [`MetricSet::has_metric`] to distinguish when it matters.
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.values.get(name).copied().flatten()
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when the window matched no rows at all.
    pub fn no_data(&self) -> bool {
        self.row_count == 0
    }
}
