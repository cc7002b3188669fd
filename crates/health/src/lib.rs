//! # Meridian Health Scorer
//!
//! Combines a caller-selected subset of metrics into one composite
//! indicator. The engine owns only the combination contract: each chosen
//! metric is normalized against the caller's floor/ceiling, weighted with
//! the caller's weight, and summed. Which metrics participate, their
//! weights, and their normalization bounds are entirely configuration —
//! nothing in this crate encodes a business threshold.

use configuration::HealthWeights;
use core_types::MetricSet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::HealthError;

/// One component's contribution to the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub metric: String,
    pub weight: Decimal,
    /// The metric's raw value in the scored window; `None` when the window
    /// left it undefined.
    pub raw: Option<Decimal>,
    /// Raw value clamped to the caller's bounds and scaled to 0..=1.
    pub normalized: Option<Decimal>,
    pub weighted: Option<Decimal>,
}

/// The composite health score with its per-component breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Weighted sum of the normalized components. `None` when any selected
    /// metric is undefined for the window — a composite over a partial set
    /// would not be the score the caller configured.
    pub composite: Option<Decimal>,
    pub components: Vec<ComponentScore>,
    /// Metric names that were undefined and therefore blocked the composite.
    pub undefined: Vec<String>,
}

/// Scores one metric set against the caller's weighted composition.
///
/// A component that names a metric the set has never heard of is a
/// configuration mistake and errors out; a metric that is present but
/// undefined for this window (empty window, zero denominator) is an
/// ordinary data condition and shows up in [`HealthReport::undefined`].
pub fn health_score(set: &MetricSet, weights: &HealthWeights) -> Result<HealthReport, HealthError> {
    let mut components = Vec::with_capacity(weights.components().len());
    let mut undefined = Vec::new();
    let mut composite = Some(Decimal::ZERO);

    for spec in weights.components() {
        if !set.has_metric(&spec.metric) {
            return Err(HealthError::UnknownMetric(spec.metric.clone()));
        }
        let raw = set.get(&spec.metric);
        let normalized = raw.map(|v| normalize(v, spec.floor, spec.ceiling));
        let weighted = normalized.map(|n| n * spec.weight);

        match weighted {
            Some(w) => {
                composite = composite.map(|total| total + w);
            }
            None => {
                undefined.push(spec.metric.clone());
                composite = None;
            }
        }

        components.push(ComponentScore {
            metric: spec.metric.clone(),
            weight: spec.weight,
            raw,
            normalized,
            weighted,
        });
    }

    Ok(HealthReport {
        composite,
        components,
        undefined,
    })
}

/// Clamps a value into the caller's bounds and scales it to 0..=1.
/// Bounds are validated at configuration time, so the span is never zero.
fn normalize(value: Decimal, floor: Decimal, ceiling: Decimal) -> Decimal {
    let clamped = value.clamp(floor, ceiling);
    (clamped - floor) / (ceiling - floor)
}
