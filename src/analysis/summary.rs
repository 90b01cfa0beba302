use crate::analysis::growth::period_series;
use crate::core::period::{month_label, Frequency};
use crate::core::table::RecordTable;
use crate::core::value::{Metric, Unavailable};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Latest value of a metric and how it moved since the previous period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub column: String,
    pub last_period: Option<NaiveDate>,
    pub last_value: Metric,
    /// Change from the previous distinct period.
    pub delta: Metric,
    pub first_period: Option<NaiveDate>,
    pub frequency: Frequency,
}

impl PeriodSummary {
    /// `"Jan 2020 - Dec 2020"`, or `None` for an empty table.
    pub fn range_label(&self) -> Option<String> {
        match (self.first_period, self.last_period) {
            (Some(first), Some(last)) => Some(format!(
                "{} - {}",
                first.format("%b %Y"),
                last.format("%b %Y")
            )),
            _ => None,
        }
    }
}

/// Summarise `column` over the periods of `table`.
pub fn summarize(table: &RecordTable, column: &str) -> Result<PeriodSummary> {
    let series = period_series(table, column)?;
    let points = &series.points;

    let last = points.last();
    let last_value = match last.and_then(|p| p.value) {
        Some(v) => Metric::Available(v),
        None if last.is_some() => Metric::Unavailable(Unavailable::MissingValue),
        None => Metric::Unavailable(Unavailable::InsufficientData),
    };

    let delta = match points.len() {
        0 | 1 => Metric::Unavailable(Unavailable::NoPriorValue),
        len => match (points[len - 1].value, points[len - 2].value) {
            (Some(cur), Some(prev)) => Metric::Available(cur - prev),
            _ => Metric::Unavailable(Unavailable::MissingValue),
        },
    };

    Ok(PeriodSummary {
        column: column.to_string(),
        last_period: last.map(|p| p.period),
        last_value,
        delta,
        first_period: points.first().map(|p| p.period),
        frequency: Frequency::infer(&series.periods()),
    })
}

/// Distinct years present, newest first.
pub fn available_years(table: &RecordTable) -> Vec<i32> {
    let mut years: Vec<i32> = table.periods().iter().map(|p| p.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Distinct `YYYY-MM` months present, oldest first.
pub fn available_months(table: &RecordTable) -> Vec<String> {
    let mut periods = table.periods();
    periods.sort();
    let mut months: Vec<String> = periods.into_iter().map(month_label).collect();
    months.dedup();
    months
}
