//! # Meridian Core Types
//!
//! This crate defines the shared vocabulary of the entire system: the raw
//! e-commerce record schemas, the denormalized `AnalysisRow` that every
//! metric is computed from, and the window-tagged `MetricSet` that the
//! comparison and health-scoring layers consume.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** This crate sits at the bottom of the dependency graph.
//!   It holds data and invariants only; it never computes a metric.
//! - **Validated at the edge:** Records that carry invariants (review scores
//!   on the 1-5 scale, non-negative money) are built through constructors
//!   that enforce them, so everything above this crate can trust the data.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::OrderStatus;
pub use error::CoreError;
pub use structs::{
    AnalysisRow, Customer, DateRange, MetricSet, Order, OrderItem, Product, RawDataset, Review,
};
