use crate::core::table::RecordTable;
use crate::error::{AnalyticsError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two loaded tables a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    #[default]
    Assets,
    Liabilities,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Assets => f.write_str("Assets"),
            Dataset::Liabilities => f.write_str("Liabilities"),
        }
    }
}

impl FromStr for Dataset {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "assets" => Ok(Dataset::Assets),
            "liabilities" => Ok(Dataset::Liabilities),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unknown dataset '{}', expected 'assets' or 'liabilities'",
                other
            ))),
        }
    }
}

/// The user's current selections, passed explicitly into every pipeline call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterContext {
    pub dataset: Dataset,
    pub year: Option<i32>,
    /// 1-based calendar month.
    pub month: Option<u32>,
    /// Growth-rate lag in periods (typically 1, 3, 6 or 12).
    pub lag: usize,
    /// Absolute correlation above which a pair is reported as strong.
    pub threshold: f64,
    /// Columns to chart and compute growth for; `None` means the first
    /// numeric column.
    pub columns: Option<Vec<String>>,
    pub top_n: usize,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self {
            dataset: Dataset::Assets,
            year: None,
            month: None,
            lag: 1,
            threshold: 0.7,
            columns: None,
            top_n: 5,
        }
    }
}

impl FilterContext {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = lag;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn has_period_filter(&self) -> bool {
        self.year.is_some() || self.month.is_some()
    }

    /// Reject selections no table could satisfy.
    pub fn validate(&self) -> Result<()> {
        if let Some(m) = self.month {
            if !(1..=12).contains(&m) {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "month must be 1-12, got {}",
                    m
                )));
            }
        }
        if self.lag == 0 {
            return Err(AnalyticsError::InvalidParameter(
                "growth lag must be at least 1".into(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "correlation threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Apply the year/month selection, returning a new table.
///
/// With no period filter selected the table is returned as a copy. A month
/// without a year keeps that month in every year. A period filter on a table
/// with no period column fails with `ColumnNotFound`.
pub fn filter_table(table: &RecordTable, ctx: &FilterContext) -> Result<RecordTable> {
    if !ctx.has_period_filter() {
        return Ok(table.clone());
    }
    if !table.has_period() {
        return Err(AnalyticsError::ColumnNotFound {
            table: table.name().to_string(),
            column: "period".to_string(),
        });
    }

    let filtered = table.filter_rows(|row| match row.period() {
        Some(p) => {
            ctx.year.map_or(true, |y| p.year() == y) && ctx.month.map_or(true, |m| p.month() == m)
        }
        None => false,
    });
    log::debug!(
        "filtered '{}' by year={:?} month={:?}: {} of {} rows",
        table.name(),
        ctx.year,
        ctx.month,
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use chrono::NaiveDate;

    fn table() -> RecordTable {
        let mut b = RecordTable::builder("Assets", vec!["End of Period".into(), "Cash".into()])
            .period_column("End of Period");
        for (y, m) in [(2019, 12), (2020, 1), (2020, 2), (2021, 1)] {
            let d = NaiveDate::from_ymd_opt(y, m, 1).unwrap();
            b.push(Some(d), vec![d.into(), Value::Number(m as f64)]);
        }
        b.build().unwrap()
    }

    #[test]
    fn test_year_filter() {
        let t = table();
        let f = filter_table(&t, &FilterContext::default().with_year(2020)).unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_year_and_month_filter() {
        let t = table();
        let ctx = FilterContext::default().with_year(2020).with_month(2);
        let f = filter_table(&t, &ctx).unwrap();
        assert_eq!(f.len(), 1);
        assert_eq!(f.rows()[0].position(), 2);
    }

    #[test]
    fn test_month_across_years() {
        let f = filter_table(&table(), &FilterContext::default().with_month(1)).unwrap();
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn test_filters_start_from_full_table() {
        let t = table();
        let first = filter_table(&t, &FilterContext::default().with_year(2019)).unwrap();
        let second = filter_table(&t, &FilterContext::default().with_year(2021)).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_no_period_column() {
        let t = RecordTable::builder("T", vec!["Cash".into()])
            .row(None, vec![Value::Number(1.0)])
            .build()
            .unwrap();
        let err = filter_table(&t, &FilterContext::default().with_year(2020)).unwrap_err();
        assert!(matches!(err, AnalyticsError::ColumnNotFound { .. }));
        // no period filter: passes through
        assert_eq!(filter_table(&t, &FilterContext::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(FilterContext::default().validate().is_ok());
        assert!(FilterContext::default().with_month(13).validate().is_err());
        assert!(FilterContext::default().with_lag(0).validate().is_err());
        assert!(FilterContext::default().with_threshold(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_dataset_from_str() {
        assert_eq!("Liabilities".parse::<Dataset>().unwrap(), Dataset::Liabilities);
        assert!("equity".parse::<Dataset>().is_err());
    }
}
