//! # Meridian Dataset Assembler
//!
//! Joins the five raw record sets into the denormalized analysis table the
//! metrics engine consumes, applying the window filter in the same pass.
//!
//! ## Join semantics
//!
//! - Order item → order, product, customer: inner joins. An item whose
//!   order, product or customer is missing from the raw sets produces no
//!   row; the dropped counts are logged once per assembly.
//! - Order → review: left join. A missing review is a valid state and
//!   yields a `None` score. When the raw set carries more than one review
//!   for an order, the first one wins and the surplus is logged.
//! - The window filter applies to the order's purchase timestamp before
//!   any row is produced, so every metric downstream sees the same
//!   filtered set. Order status is *not* filtered here — delivered-only
//!   filtering is a per-metric decision.
//!
//! Zero matching rows is a valid, empty result — never an error.

use core_types::{AnalysisRow, Customer, DateRange, Order, Product, RawDataset};
use std::collections::HashMap;
use tracing::{debug, warn};

pub mod cache;

pub use cache::AssemblyCache;

/// Builds the analysis table for one window.
pub fn assemble(raw: &RawDataset, window: &DateRange) -> Vec<AnalysisRow> {
    let orders: HashMap<&str, &Order> = raw
        .orders
        .iter()
        .map(|o| (o.order_id.as_str(), o))
        .collect();
    let products: HashMap<&str, &Product> = raw
        .products
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();
    let customers: HashMap<&str, &Customer> = raw
        .customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c))
        .collect();

    // First review per order wins; surplus reviews are counted and logged.
    let mut reviews: HashMap<&str, u8> = HashMap::new();
    let mut duplicate_reviews = 0usize;
    for review in &raw.reviews {
        if reviews.contains_key(review.order_id.as_str()) {
            duplicate_reviews += 1;
        } else {
            reviews.insert(review.order_id.as_str(), review.score);
        }
    }

    let mut rows = Vec::new();
    let mut orphan_items = 0usize;
    let mut missing_products = 0usize;
    let mut missing_customers = 0usize;

    for item in &raw.order_items {
        let Some(order) = orders.get(item.order_id.as_str()) else {
            orphan_items += 1;
            continue;
        };
        if !window.contains(order.purchased_at) {
            continue;
        }
        let Some(product) = products.get(item.product_id.as_str()) else {
            missing_products += 1;
            continue;
        };
        let Some(customer) = customers.get(order.customer_id.as_str()) else {
            missing_customers += 1;
            continue;
        };

        let category = product
            .category
            .clone()
            .unwrap_or_else(|| AnalysisRow::UNCATEGORIZED.to_string());

        rows.push(AnalysisRow {
            order_id: item.order_id.clone(),
            status: order.status,
            purchased_at: order.purchased_at,
            delivered_at: order.delivered_at,
            price: item.price,
            freight: item.freight,
            category,
            customer_id: order.customer_id.clone(),
            customer_state: customer.state.clone(),
            customer_city: customer.city.clone(),
            review_score: reviews.get(item.order_id.as_str()).copied(),
        });
    }

    if orphan_items > 0 {
        warn!(count = orphan_items, "order items without a matching order");
    }
    if missing_products > 0 {
        warn!(count = missing_products, "order items without a matching product");
    }
    if missing_customers > 0 {
        warn!(count = missing_customers, "orders without a matching customer");
    }
    if duplicate_reviews > 0 {
        warn!(count = duplicate_reviews, "surplus reviews ignored (first per order wins)");
    }
    debug!(window = %window, rows = rows.len(), "assembled analysis table");

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use core_types::{OrderItem, OrderStatus, RawDataset, Review};
    use rust_decimal_macros::dec;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn order(id: &str, customer: &str, status: OrderStatus, purchased: NaiveDateTime) -> Order {
        Order {
            order_id: id.into(),
            customer_id: customer.into(),
            status,
            purchased_at: purchased,
            delivered_at: None,
        }
    }

    fn item(order_id: &str, product_id: &str) -> OrderItem {
        OrderItem::new(order_id, product_id, dec!(10), dec!(2)).unwrap()
    }

    fn product(id: &str, category: Option<&str>) -> Product {
        Product {
            product_id: id.into(),
            category: category.map(String::from),
        }
    }

    fn customer(id: &str, state: &str) -> Customer {
        Customer {
            customer_id: id.into(),
            state: state.into(),
            city: "city".into(),
        }
    }

    fn march() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2018, 3, 31).unwrap(),
        }
    }

    #[test]
    fn joins_all_dimensions_onto_one_row() {
        let raw = RawDataset::new(
            vec![order("o1", "c1", OrderStatus::Delivered, ts(2018, 3, 10))],
            vec![item("o1", "p1")],
            vec![product("p1", Some("toys"))],
            vec![customer("c1", "SP")],
            vec![Review::new("o1", 4).unwrap()],
        );

        let rows = assemble(&raw, &march());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.category, "toys");
        assert_eq!(row.customer_state, "SP");
        assert_eq!(row.review_score, Some(4));
        assert_eq!(row.revenue(), dec!(12));
    }

    #[test]
    fn window_filter_applies_to_purchase_timestamp() {
        let raw = RawDataset::new(
            vec![
                order("in", "c1", OrderStatus::Delivered, ts(2018, 3, 31)),
                order("out", "c1", OrderStatus::Delivered, ts(2018, 4, 1)),
            ],
            vec![item("in", "p1"), item("out", "p1")],
            vec![product("p1", Some("toys"))],
            vec![customer("c1", "SP")],
            vec![],
        );

        let rows = assemble(&raw, &march());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "in");
    }

    #[test]
    fn empty_window_is_empty_not_an_error() {
        let raw = RawDataset::new(
            vec![order("o1", "c1", OrderStatus::Delivered, ts(2017, 1, 1))],
            vec![item("o1", "p1")],
            vec![product("p1", None)],
            vec![customer("c1", "SP")],
            vec![],
        );
        assert!(assemble(&raw, &march()).is_empty());
    }

    #[test]
    fn missing_category_defaults_instead_of_dropping() {
        let raw = RawDataset::new(
            vec![order("o1", "c1", OrderStatus::Delivered, ts(2018, 3, 10))],
            vec![item("o1", "p1")],
            vec![product("p1", None)],
            vec![customer("c1", "SP")],
            vec![],
        );

        let rows = assemble(&raw, &march());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, AnalysisRow::UNCATEGORIZED);
    }

    #[test]
    fn inner_join_misses_drop_the_row() {
        let raw = RawDataset::new(
            vec![order("o1", "ghost-customer", OrderStatus::Delivered, ts(2018, 3, 10))],
            vec![
                item("o1", "ghost-product"),
                item("ghost-order", "p1"),
            ],
            vec![product("p1", Some("toys"))],
            vec![customer("c1", "SP")],
            vec![],
        );
        assert!(assemble(&raw, &march()).is_empty());
    }

    #[test]
    fn first_review_wins_on_duplicates() {
        let raw = RawDataset::new(
            vec![order("o1", "c1", OrderStatus::Delivered, ts(2018, 3, 10))],
            vec![item("o1", "p1")],
            vec![product("p1", Some("toys"))],
            vec![customer("c1", "SP")],
            vec![Review::new("o1", 5).unwrap(), Review::new("o1", 1).unwrap()],
        );

        let rows = assemble(&raw, &march());
        assert_eq!(rows[0].review_score, Some(5));
    }

    #[test]
    fn one_order_with_three_items_produces_three_rows() {
        let raw = RawDataset::new(
            vec![order("o1", "c1", OrderStatus::Delivered, ts(2018, 3, 10))],
            vec![item("o1", "p1"), item("o1", "p1"), item("o1", "p1")],
            vec![product("p1", Some("toys"))],
            vec![customer("c1", "SP")],
            vec![],
        );
        assert_eq!(assemble(&raw, &march()).len(), 3);
    }
}
