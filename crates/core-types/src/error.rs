use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown order status: '{0}'")]
    UnknownStatus(String),

    #[error("Review score {0} is outside the 1-5 scale")]
    ScoreOutOfRange(i64),

    #[error("Negative {field} ({value}) on order item for order '{order_id}'")]
    NegativeAmount {
        field: &'static str,
        value: Decimal,
        order_id: String,
    },
}
