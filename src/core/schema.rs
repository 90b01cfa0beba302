use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default name of the reporting-period column.
pub const DEFAULT_PERIOD_COLUMN: &str = "End of Period";

/// A category and the substring markers that place a column in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub markers: Vec<String>,
}

impl CategoryRule {
    pub fn new<I, S>(name: impl Into<String>, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-sensitive substring match against any marker.
    pub fn matches(&self, column: &str) -> bool {
        self.markers.iter().any(|m| column.contains(m.as_str()))
    }
}

/// Which numeric columns make up an overall "total".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalMode {
    /// Sum every numeric column.
    #[default]
    AllNumeric,
    /// Sum only columns whose name starts with the prefix, e.g. `"Total "`.
    Prefix(String),
}

impl TotalMode {
    pub fn select(&self, numeric_columns: &[String]) -> Vec<String> {
        match self {
            TotalMode::AllNumeric => numeric_columns.to_vec(),
            TotalMode::Prefix(p) => numeric_columns
                .iter()
                .filter(|c| c.starts_with(p.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// How an "average per metric" is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMode {
    /// Mean of each column's mean.
    #[default]
    PerColumnMean,
    /// Mean of every cell across all columns.
    Flattened,
}

/// Describes a dataset's column vocabulary.
///
/// Loaded from JSON so the pipeline can be pointed at datasets that name
/// their period column or categories differently:
///
/// ```json
/// {
///   "period_column": "End of Period",
///   "categories": [{ "name": "Deposits", "markers": ["Deposits"] }],
///   "total_mode": { "prefix": "Total " },
///   "average_mode": "per_column_mean",
///   "day_first": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDescriptor {
    pub period_column: String,
    pub categories: Vec<CategoryRule>,
    pub total_mode: TotalMode,
    pub average_mode: AverageMode,
    /// Read numeric dates such as `01/02/2020` as day first (1 Feb).
    /// Month first is the default.
    pub day_first: bool,
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self {
            period_column: DEFAULT_PERIOD_COLUMN.to_string(),
            categories: vec![
                CategoryRule::new("Cash and Balances", ["Cash"]),
                CategoryRule::new("Investments", ["Investments"]),
                CategoryRule::new("Loans and Advances", ["Loans and Advances"]),
                CategoryRule::new("Deposits", ["Deposits"]),
                CategoryRule::new("Borrowings", ["Borrowings"]),
                CategoryRule::new("Capital", ["Capital"]),
            ],
            total_mode: TotalMode::AllNumeric,
            average_mode: AverageMode::PerColumnMean,
            day_first: false,
        }
    }
}

impl SchemaDescriptor {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AnalyticsError::unavailable(path.display().to_string(), e))?;
        Self::from_json(&content)
    }
}
