//! Synthetic monthly balance sheets.
//!
//! Generates random-walk datasets shaped like the central bank's published
//! assets and liabilities tables, for benchmarks, demos and tests.

use crate::core::schema::DEFAULT_PERIOD_COLUMN;
use crate::core::table::RecordTable;
use crate::core::value::Value;
use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;

/// Configuration for [`generate_balance_sheet`].
#[derive(Debug, Clone)]
pub struct BalanceSheetConfig {
    pub name: String,
    /// Number of monthly periods.
    pub months: usize,
    /// First period; rows are dated at month end.
    pub start: NaiveDate,
    pub columns: Vec<String>,
    /// Range of each column's opening value.
    pub min_value: f64,
    pub max_value: f64,
    /// Largest month-on-month move, as a fraction (0.05 = ±5%).
    pub volatility: f64,
}

impl BalanceSheetConfig {
    pub fn assets() -> Self {
        Self {
            name: "Assets".to_string(),
            columns: [
                "Cash on Hand",
                "Balances with Central Bank",
                "Investments in Treasury Bills",
                "Investments in Treasury Bonds",
                "Total Loans and Advances",
                "Other Assets",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ..Self::default()
        }
    }

    pub fn liabilities() -> Self {
        Self {
            name: "Liabilities".to_string(),
            columns: [
                "Demand Deposits",
                "Time and Savings Deposits",
                "Borrowings from Banks",
                "Capital and Reserves",
                "Other Liabilities",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ..Self::default()
        }
    }
}

impl Default for BalanceSheetConfig {
    fn default() -> Self {
        Self {
            name: "Assets".to_string(),
            months: 60,
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            columns: vec!["Cash on Hand".to_string()],
            min_value: 10_000.0,
            max_value: 5_000_000.0,
            volatility: 0.05,
        }
    }
}

/// Generate a random balance sheet with one row per month end.
pub fn generate_balance_sheet(config: &BalanceSheetConfig) -> Result<RecordTable> {
    if config.columns.is_empty() || config.min_value >= config.max_value {
        return Err(AnalyticsError::InvalidParameter(
            "synthetic balance sheet needs columns and min_value < max_value".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let mut levels: Vec<f64> = config
        .columns
        .iter()
        .map(|_| rng.gen_range(config.min_value..config.max_value))
        .collect();

    let mut header = vec![DEFAULT_PERIOD_COLUMN.to_string()];
    header.extend(config.columns.iter().cloned());
    let mut builder = RecordTable::builder(config.name.clone(), header)
        .period_column(DEFAULT_PERIOD_COLUMN);

    let first = config.start.with_day(1).unwrap_or(config.start);
    for m in 0..config.months {
        let period = month_end(first, m as u32).ok_or_else(|| {
            AnalyticsError::InvalidParameter(format!("period {} out of range", m))
        })?;

        let mut values = Vec::with_capacity(levels.len() + 1);
        values.push(Value::Period(period));
        for level in levels.iter_mut() {
            if m > 0 && config.volatility > 0.0 {
                let step = rng.gen_range(-config.volatility..config.volatility);
                *level = (*level * (1.0 + step)).max(0.0);
            }
            values.push(Value::Number((*level * 100.0).round() / 100.0));
        }
        builder.push(Some(period), values);
    }

    builder.build()
}

fn month_end(first_of_start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    first_of_start
        .checked_add_months(Months::new(offset + 1))?
        .pred_opt()
}
