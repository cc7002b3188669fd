//! # Meridian Data Loader
//!
//! The data-provider side of the pipeline: reads the five raw e-commerce
//! record sets from CSV files and materializes them as an immutable
//! [`RawDataset`] for the assembler.
//!
//! Load and shape problems are fatal here — a missing file, an unreadable
//! row, an unknown order status or an off-scale review score all surface as
//! a specific [`LoadError`] before any computation starts. Downstream crates
//! can therefore assume every record they see is well-formed.

use chrono::NaiveDateTime;
use core_types::{Customer, Order, OrderItem, OrderStatus, Product, RawDataset, Review};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub mod error;

pub use error::LoadError;

/// File names of the raw record sets inside the data directory.
pub const ORDERS_FILE: &str = "orders_dataset.csv";
pub const ORDER_ITEMS_FILE: &str = "order_items_dataset.csv";
pub const PRODUCTS_FILE: &str = "products_dataset.csv";
pub const CUSTOMERS_FILE: &str = "customers_dataset.csv";
pub const REVIEWS_FILE: &str = "order_reviews_dataset.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==============================================================================
// Raw CSV row shapes (column names as they appear in the source files)
// ==============================================================================

#[derive(Debug, Deserialize)]
struct OrderRow {
    order_id: String,
    customer_id: String,
    order_status: String,
    order_purchase_timestamp: String,
    order_delivered_customer_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    price: Decimal,
    freight_value: Decimal,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    product_id: String,
    product_category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id: String,
    customer_state: String,
    customer_city: String,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    order_id: String,
    review_score: i64,
}

/// Loads all five raw record sets from `dir` and validates them into a
/// [`RawDataset`].
pub fn load_dir(dir: &Path) -> Result<RawDataset, LoadError> {
    let orders = convert(ORDERS_FILE, read_rows::<OrderRow>(dir, ORDERS_FILE)?, order_from_row)?;
    let order_items = convert(
        ORDER_ITEMS_FILE,
        read_rows::<OrderItemRow>(dir, ORDER_ITEMS_FILE)?,
        item_from_row,
    )?;
    let products = convert(
        PRODUCTS_FILE,
        read_rows::<ProductRow>(dir, PRODUCTS_FILE)?,
        product_from_row,
    )?;
    let customers = convert(
        CUSTOMERS_FILE,
        read_rows::<CustomerRow>(dir, CUSTOMERS_FILE)?,
        customer_from_row,
    )?;
    let reviews = convert(
        REVIEWS_FILE,
        read_rows::<ReviewRow>(dir, REVIEWS_FILE)?,
        review_from_row,
    )?;

    let dataset = RawDataset::new(orders, order_items, products, customers, reviews);
    info!(
        orders = dataset.orders.len(),
        order_items = dataset.order_items.len(),
        products = dataset.products.len(),
        customers = dataset.customers.len(),
        reviews = dataset.reviews.len(),
        version = dataset.version(),
        "loaded raw datasets"
    );
    Ok(dataset)
}

fn read_rows<T: DeserializeOwned>(dir: &Path, name: &'static str) -> Result<Vec<T>, LoadError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(LoadError::MissingDataset { name, path });
    }
    let mut reader =
        csv::Reader::from_path(&path).map_err(|source| LoadError::Malformed { name, source })?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| LoadError::Malformed { name, source })?;
    info!(dataset = name, records = rows.len(), "read raw dataset");
    Ok(rows)
}

/// Applies a fallible row conversion, attaching the 1-based record number
/// to any validation failure.
fn convert<R, T>(
    name: &'static str,
    rows: Vec<R>,
    f: impl Fn(R) -> Result<T, String>,
) -> Result<Vec<T>, LoadError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            f(row).map_err(|message| LoadError::InvalidRecord {
                name,
                record: i + 1,
                message,
            })
        })
        .collect()
}

fn order_from_row(row: OrderRow) -> Result<Order, String> {
    let status = OrderStatus::parse(&row.order_status).map_err(|e| e.to_string())?;
    let purchased_at = parse_timestamp(&row.order_purchase_timestamp)?;
    let delivered_at = match row.order_delivered_customer_date.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_timestamp(raw)?),
    };
    Ok(Order {
        order_id: row.order_id,
        customer_id: row.customer_id,
        status,
        purchased_at,
        delivered_at,
    })
}

fn item_from_row(row: OrderItemRow) -> Result<OrderItem, String> {
    OrderItem::new(row.order_id, row.product_id, row.price, row.freight_value)
        .map_err(|e| e.to_string())
}

fn product_from_row(row: ProductRow) -> Result<Product, String> {
    // An empty category cell means the same as a missing one.
    let category = row
        .product_category_name
        .filter(|c| !c.trim().is_empty());
    Ok(Product {
        product_id: row.product_id,
        category,
    })
}

fn customer_from_row(row: CustomerRow) -> Result<Customer, String> {
    Ok(Customer {
        customer_id: row.customer_id,
        state: row.customer_state,
        city: row.customer_city,
    })
}

fn review_from_row(row: ReviewRow) -> Result<Review, String> {
    Review::new(row.order_id, row.review_score).map_err(|e| e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}
