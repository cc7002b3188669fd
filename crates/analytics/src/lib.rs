//! # Meridian Metrics Engine
//!
//! Pure calculators deriving business metrics — revenue, product,
//! geographic, customer experience — from an assembled analysis table.
//!
//! ## Architectural Principles
//!
//! - **Pure logic crate:** the engine knows nothing about how the table was
//!   assembled or where the raw data came from. Same rows in, same reports
//!   out, every time.
//! - **Undefined is not zero:** every ratio with an empty denominator is
//!   `None`, never NaN, never a division error, and never a silent `0`.
//! - **No business thresholds:** top-N cutoffs, delivery buckets and
//!   promoter/detractor bands arrive from the caller's configuration.
//!
//! ## Public API
//!
//! - `MetricsEngine`: the stateless calculator.
//! - Report structs (`RevenueReport`, `CategoryBreakdown`, ...): the typed
//!   outputs, plus the flattened window-tagged `MetricSet`.

pub mod engine;
pub mod report;

pub use engine::MetricsEngine;
pub use report::{
    CategoryBreakdown, CategoryPerformance, DeliveryBucket, ExperienceReport, RevenueReport,
    StatePerformance,
};

/// Canonical metric names used in flattened [`core_types::MetricSet`]s.
/// Comparison and health-score configuration refer to metrics by these.
pub mod metric {
    pub const TOTAL_REVENUE: &str = "total_revenue";
    pub const ORDER_COUNT: &str = "order_count";
    pub const ITEMS_SOLD: &str = "items_sold";
    pub const AVERAGE_ORDER_VALUE: &str = "average_order_value";
    pub const AVERAGE_ITEM_PRICE: &str = "average_item_price";
    pub const MEDIAN_ORDER_VALUE: &str = "median_order_value";
    pub const ORDER_VALUE_STD_DEV: &str = "order_value_std_dev";
    pub const REVIEW_COUNT: &str = "review_count";
    pub const AVERAGE_REVIEW_SCORE: &str = "average_review_score";
    pub const NPS_ESTIMATE: &str = "nps_estimate";
    pub const AVERAGE_DELIVERY_DAYS: &str = "average_delivery_days";
    pub const MEDIAN_DELIVERY_DAYS: &str = "median_delivery_days";
}
