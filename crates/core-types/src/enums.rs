use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of an order, as reported by the order management
/// system. Revenue metrics only count `Delivered` orders; every other
/// status contributes zero revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Delivered,
    Shipped,
    Canceled,
    Invoiced,
    Processing,
    Unavailable,
    Approved,
    Created,
}

impl OrderStatus {
    /// Parses the raw status string from the orders dataset.
    ///
    /// Matching is case-insensitive. An unrecognized status is an error:
    /// silently mapping it to some default would let a new upstream status
    /// leak into (or out of) the revenue base unnoticed.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "delivered" => Ok(OrderStatus::Delivered),
            "shipped" => Ok(OrderStatus::Shipped),
            "canceled" => Ok(OrderStatus::Canceled),
            "invoiced" => Ok(OrderStatus::Invoiced),
            "processing" => Ok(OrderStatus::Processing),
            "unavailable" => Ok(OrderStatus::Unavailable),
            "approved" => Ok(OrderStatus::Approved),
            "created" => Ok(OrderStatus::Created),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }

    /// Returns true if the order reached the customer.
    pub fn is_delivered(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Delivered => "delivered",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Approved => "approved",
            OrderStatus::Created => "created",
        };
        f.write_str(s)
    }
}
