//! Period-over-period growth and pointwise ratios.

use crate::core::table::RecordTable;
use crate::core::value::{Metric, Unavailable};
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value observed at a reporting period. `None` means the value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub period: NaiveDate,
    pub value: Option<f64>,
}

/// A derived metric at a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetric {
    pub period: NaiveDate,
    pub value: Metric,
}

/// A period-ordered series with at most one point per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries {
    pub name: String,
    pub points: Vec<PeriodPoint>,
}

impl PeriodSeries {
    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn periods(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.period).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Growth of this series over `lag` periods, labelled by period.
    pub fn growth(&self, lag: usize) -> Result<Vec<PeriodMetric>> {
        let rates = growth_rate(&self.values(), lag)?;
        Ok(label(&self.points, rates))
    }
}

/// Percentage change against the value `lag` entries earlier:
/// `(current - previous) / previous * 100`.
///
/// The first `lag` entries have no prior value. A zero previous value gives
/// `DivisionByZero` and a missing input gives `MissingValue`; neither stops
/// later entries from being computed.
///
/// ```
/// use balance_sheet_analytics::analysis::growth::growth_rate;
/// use balance_sheet_analytics::core::value::{Metric, Unavailable};
///
/// let rates = growth_rate(&[Some(100.0), Some(150.0)], 1).unwrap();
/// assert_eq!(rates[0], Metric::Unavailable(Unavailable::NoPriorValue));
/// assert_eq!(rates[1], Metric::Available(50.0));
/// ```
pub fn growth_rate(series: &[Option<f64>], lag: usize) -> Result<Vec<Metric>> {
    if lag == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "growth lag must be at least 1".into(),
        ));
    }
    Ok(series
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if i < lag {
                return Metric::Unavailable(Unavailable::NoPriorValue);
            }
            match (*current, series[i - lag]) {
                (Some(cur), Some(prev)) => {
                    if prev == 0.0 {
                        Metric::Unavailable(Unavailable::DivisionByZero)
                    } else {
                        Metric::finite_or((cur - prev) / prev * 100.0, Unavailable::DivisionByZero)
                    }
                }
                _ => Metric::Unavailable(Unavailable::MissingValue),
            }
        })
        .collect())
}

/// Pointwise `numerator / denominator`.
///
/// A zero denominator gives `DivisionByZero` for that point only. Series of
/// different lengths are rejected; align them by period first.
pub fn ratio(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Result<Vec<Metric>> {
    if numerator.len() != denominator.len() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "ratio series differ in length: {} vs {}",
            numerator.len(),
            denominator.len()
        )));
    }
    Ok(numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| match (n, d) {
            (Some(_), Some(d)) if *d == 0.0 => Metric::Unavailable(Unavailable::DivisionByZero),
            (Some(n), Some(d)) => Metric::finite_or(n / d, Unavailable::DivisionByZero),
            _ => Metric::Unavailable(Unavailable::MissingValue),
        })
        .collect())
}

/// A column as a period series. Rows sharing a period are summed; a period
/// whose rows are all missing for the column keeps a missing value.
pub fn period_series(table: &RecordTable, column: &str) -> Result<PeriodSeries> {
    period_totals(table, &[column.to_string()], column)
}

/// The per-period total over several columns, named `name`.
pub fn period_totals(table: &RecordTable, columns: &[String], name: &str) -> Result<PeriodSeries> {
    let indices = table.numeric_indices(columns)?;
    if !table.has_period() {
        return Err(AnalyticsError::ColumnNotFound {
            table: table.name().to_string(),
            column: "period".to_string(),
        });
    }

    let mut by_period: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for row in table.rows() {
        let Some(period) = row.period() else {
            continue;
        };
        let entry = by_period.entry(period).or_insert(None);
        for &i in &indices {
            if let Some(v) = row.values()[i].as_number() {
                *entry = Some(entry.unwrap_or(0.0) + v);
            }
        }
    }

    Ok(PeriodSeries {
        name: name.to_string(),
        points: by_period
            .into_iter()
            .map(|(period, value)| PeriodPoint { period, value })
            .collect(),
    })
}

/// Inner join of two series on period. Periods present in only one series
/// are dropped.
pub fn align(a: &PeriodSeries, b: &PeriodSeries) -> Vec<(NaiveDate, Option<f64>, Option<f64>)> {
    let rhs: BTreeMap<NaiveDate, Option<f64>> =
        b.points.iter().map(|p| (p.period, p.value)).collect();
    a.points
        .iter()
        .filter_map(|p| rhs.get(&p.period).map(|v| (p.period, p.value, *v)))
        .collect()
}

/// Ratio of two series over the periods they share.
pub fn aligned_ratio(numerator: &PeriodSeries, denominator: &PeriodSeries) -> Vec<PeriodMetric> {
    let joined = align(numerator, denominator);
    let (nums, dens): (Vec<Option<f64>>, Vec<Option<f64>>) =
        joined.iter().map(|(_, n, d)| (*n, *d)).unzip();
    // equal lengths by construction
    let ratios = ratio(&nums, &dens).unwrap_or_default();
    joined
        .iter()
        .zip(ratios)
        .map(|((period, _, _), value)| PeriodMetric {
            period: *period,
            value,
        })
        .collect()
}

fn label(points: &[PeriodPoint], metrics: Vec<Metric>) -> Vec<PeriodMetric> {
    points
        .iter()
        .zip(metrics)
        .map(|(p, value)| PeriodMetric {
            period: p.period,
            value,
        })
        .collect()
}
