use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::DateRange;
use serde::{Deserialize, Serialize};

/// The caller's description of an analysis window: either an explicit
/// inclusive date range, or a calendar period (full year, or one month of
/// a year) that resolves into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    Range {
        start: NaiveDate,
        end: NaiveDate,
    },
    Calendar {
        year: i32,
        month: Option<u32>,
    },
}

impl WindowSpec {
    /// Normalizes the specification into a concrete inclusive date range.
    ///
    /// Errors on an end date before the start date, a month outside 1-12,
    /// or a calendar period that is not representable.
    pub fn resolve(&self) -> Result<DateRange, ConfigError> {
        match *self {
            WindowSpec::Range { start, end } => {
                if end < start {
                    return Err(ConfigError::ValidationError(format!(
                        "window end {end} is before its start {start}"
                    )));
                }
                Ok(DateRange { start, end })
            }
            WindowSpec::Calendar { year, month } => match month {
                None => Ok(DateRange {
                    start: ymd(year, 1, 1)?,
                    end: ymd(year, 12, 31)?,
                }),
                Some(m) => month_range(year, m),
            },
        }
    }

    /// The comparison window one period back.
    ///
    /// Calendar windows step back a whole calendar period (February 2018
    /// compares against January 2018, 2018 against 2017) even when the day
    /// counts differ; explicit ranges compare against the adjacent
    /// preceding range of equal day-length.
    pub fn comparison(&self) -> Result<DateRange, ConfigError> {
        match *self {
            WindowSpec::Range { .. } => {
                let range = self.resolve()?;
                range.previous().ok_or_else(|| {
                    ConfigError::ValidationError(format!(
                        "window {range} has no representable preceding period"
                    ))
                })
            }
            WindowSpec::Calendar { year, month } => match month {
                None => WindowSpec::Calendar {
                    year: year - 1,
                    month: None,
                }
                .resolve(),
                Some(1) => month_range(year - 1, 12),
                Some(m) => month_range(year, m - 1),
            },
        }
    }

    /// Short period label for tagging metric sets, e.g. "2018", "2018-03",
    /// or the explicit range itself.
    pub fn label(&self) -> String {
        match *self {
            WindowSpec::Range { start, end } => format!("{start} to {end}"),
            WindowSpec::Calendar { year, month: None } => year.to_string(),
            WindowSpec::Calendar {
                year,
                month: Some(m),
            } => format!("{year}-{m:02}"),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, ConfigError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ConfigError::ValidationError(format!("{year:04}-{month:02}-{day:02} is not a valid date"))
    })
}

/// The inclusive range covering one calendar month.
fn month_range(year: i32, month: u32) -> Result<DateRange, ConfigError> {
    if !(1..=12).contains(&month) {
        return Err(ConfigError::ValidationError(format!(
            "month {month} is outside 1-12"
        )));
    }
    let start = ymd(year, month, 1)?;
    // First day of the next month, minus one day, is the last day of this
    // month regardless of its length.
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = ymd(next_year, next_month, 1)?
        .pred_opt()
        .ok_or_else(|| ConfigError::ValidationError("month has no last day".to_string()))?;
    Ok(DateRange { start, end })
}
