//! # Meridian Comparison Engine
//!
//! Period-over-period math: per-metric deltas and growth between two
//! window-tagged metric sets, and aligned time-bucketed revenue series for
//! overlay charting.
//!
//! Growth against a zero or undefined previous value is reported as `None`
//! ("not computable"), never as infinity and never as an error — a window
//! with no prior activity is an ordinary situation, not a failure.

use chrono::Datelike;
use core_types::{AnalysisRow, DateRange, MetricSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Period-over-period movement of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub current: Option<Decimal>,
    pub previous: Option<Decimal>,
    /// `current − previous`; `None` when either side is undefined.
    pub delta: Option<Decimal>,
    /// Relative growth in percent; `None` when not computable (previous
    /// missing, undefined, or zero).
    pub growth_pct: Option<Decimal>,
}

/// Compares every metric of the current set against the previous set.
///
/// The current set decides which metrics appear; a metric the previous
/// window never produced simply compares against `None`.
pub fn compare(current: &MetricSet, previous: &MetricSet) -> Vec<MetricComparison> {
    current
        .values
        .iter()
        .map(|(name, cur)| {
            let prev = previous.values.get(name).copied().flatten();
            let delta = match (cur, prev) {
                (Some(c), Some(p)) => Some(*c - p),
                _ => None,
            };
            let growth_pct = match (cur, prev) {
                (Some(c), Some(p)) if p != Decimal::ZERO => {
                    Some((*c - p) / p * Decimal::from(100))
                }
                _ => None,
            };
            MetricComparison {
                metric: name.clone(),
                current: *cur,
                previous: prev,
                delta,
                growth_pct,
            }
        })
        .collect()
}

/// Time resolution of a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendGranularity {
    Daily,
    Weekly,
    Monthly,
}

/// One bucket of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    /// Delivered revenue in the bucket. Zero is a true zero.
    pub value: Decimal,
}

/// Two aligned series for overlay charting: index `i` in both sides is the
/// same offset from the respective window's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPair {
    pub granularity: TrendGranularity,
    pub current: Vec<TrendPoint>,
    pub previous: Vec<TrendPoint>,
}

/// Buckets delivered revenue over both windows at the given granularity.
///
/// Both series get exactly the bucket count of the *current* window, so
/// chart overlays align index-for-index regardless of leap years or month
/// lengths; previous-window activity beyond that count is cut off rather
/// than shifting the alignment.
pub fn trend_series(
    current_rows: &[AnalysisRow],
    current_window: &DateRange,
    previous_rows: &[AnalysisRow],
    previous_window: &DateRange,
    granularity: TrendGranularity,
) -> TrendPair {
    let buckets = bucket_count(current_window, granularity);
    TrendPair {
        granularity,
        current: bucket_series(current_rows, current_window, granularity, buckets),
        previous: bucket_series(previous_rows, previous_window, granularity, buckets),
    }
}

fn bucket_count(window: &DateRange, granularity: TrendGranularity) -> usize {
    match granularity {
        TrendGranularity::Daily => window.days() as usize,
        TrendGranularity::Weekly => (window.days() as usize).div_ceil(7),
        TrendGranularity::Monthly => {
            let months = (window.end.year() - window.start.year()) * 12
                + (window.end.month() as i32 - window.start.month() as i32);
            (months + 1) as usize
        }
    }
}

fn bucket_series(
    rows: &[AnalysisRow],
    window: &DateRange,
    granularity: TrendGranularity,
    buckets: usize,
) -> Vec<TrendPoint> {
    let mut values = vec![Decimal::ZERO; buckets];
    for row in rows.iter().filter(|r| r.status.is_delivered()) {
        let date = row.purchased_at.date();
        if date < window.start {
            continue;
        }
        let idx = match granularity {
            TrendGranularity::Daily => (date - window.start).num_days() as usize,
            TrendGranularity::Weekly => ((date - window.start).num_days() / 7) as usize,
            TrendGranularity::Monthly => {
                let months = (date.year() - window.start.year()) * 12
                    + (date.month() as i32 - window.start.month() as i32);
                months as usize
            }
        };
        if idx < buckets {
            values[idx] += row.revenue();
        }
    }

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| TrendPoint {
            label: bucket_label(window, granularity, i),
            value,
        })
        .collect()
}

fn bucket_label(window: &DateRange, granularity: TrendGranularity, index: usize) -> String {
    match granularity {
        TrendGranularity::Daily => (window.start + chrono::Duration::days(index as i64)).to_string(),
        TrendGranularity::Weekly => {
            (window.start + chrono::Duration::days(7 * index as i64)).to_string()
        }
        TrendGranularity::Monthly => {
            let total = window.start.year() * 12 + window.start.month0() as i32 + index as i32;
            format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
        }
    }
}
