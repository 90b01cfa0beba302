use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a [`RecordTable`](crate::core::table::RecordTable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Period(NaiveDate),
    Text(String),
    Missing,
}

impl Value {
    /// Coerce a raw CSV cell.
    ///
    /// Empty cells and non-finite numbers become [`Value::Missing`].
    /// Thousands separators are accepted (`"1,250.5"` is `1250.5`).
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        let parsed = trimmed
            .parse::<f64>()
            .or_else(|_| trimmed.replace(',', "").parse::<f64>());
        match parsed {
            Ok(n) if n.is_finite() => Value::Number(n),
            Ok(_) => Value::Missing,
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Period(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Missing
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Period(d)
    }
}

/// Why a metric could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// No numeric columns were selected.
    NoNumericColumns,
    /// A category matched no columns.
    NoMatchingColumns,
    /// The point lies within the first `lag` periods.
    NoPriorValue,
    /// An input value was missing.
    MissingValue,
    DivisionByZero,
    /// Fewer than two paired observations.
    InsufficientData,
    ZeroVariance,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Unavailable::NoNumericColumns => "no numeric columns",
            Unavailable::NoMatchingColumns => "no matching columns",
            Unavailable::NoPriorValue => "no prior value",
            Unavailable::MissingValue => "missing value",
            Unavailable::DivisionByZero => "division by zero",
            Unavailable::InsufficientData => "insufficient data",
            Unavailable::ZeroVariance => "zero variance",
        };
        f.write_str(text)
    }
}

/// A derived number that may be "not available".
///
/// Per-metric failures never propagate as errors; they are carried as
/// `Unavailable(reason)` so the rest of a batch is still computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Available(f64),
    Unavailable(Unavailable),
}

impl Metric {
    /// Wrap a computed number, mapping non-finite results to `fallback`.
    pub fn finite_or(value: f64, fallback: Unavailable) -> Self {
        if value.is_finite() {
            Metric::Available(value)
        } else {
            Metric::Unavailable(fallback)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Available(v) => Some(*v),
            Metric::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }

    pub fn reason(&self) -> Option<Unavailable> {
        match self {
            Metric::Available(_) => None,
            Metric::Unavailable(r) => Some(*r),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Metric::Available(v) => match f.precision() {
                Some(p) => format!("{:.*}", p, v),
                None => v.to_string(),
            },
            Metric::Unavailable(r) => format!("n/a ({})", r),
        };
        // right-aligned, so columns of metrics line up in text reports
        match f.width() {
            Some(w) => write!(f, "{:>w$}", text, w = w),
            None => f.write_str(&text),
        }
    }
}
