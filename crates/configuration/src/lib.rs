//! # Meridian Configuration
//!
//! The full configuration surface of the metrics engine: window
//! specifications, delivery-time bucket boundaries, promoter/detractor score
//! bands, top-N cutoffs, and health-score weights.
//!
//! Every business threshold in the system lives here and is supplied by the
//! caller — the engine crates embed no defaults. All validation happens in
//! this crate, up front, so that by the time computation starts every value
//! the engines receive is already known to be well-formed.

pub mod error;
pub mod settings;
pub mod window;

pub use error::ConfigError;
pub use settings::{
    AnalysisSettings, BucketSpec, HealthComponent, HealthWeights, ScoreBands, TopN,
};
pub use window::WindowSpec;
