use thiserror::Error;

/// Errors raised by the analytics pipeline.
///
/// Only [`AnalyticsError::DataUnavailable`] is fatal to a session. Column and
/// type errors reject a single request before any computation; per-metric
/// failures (division by zero, insufficient data) are never errors and are
/// reported as [`crate::core::value::Metric::Unavailable`] instead.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("data source '{source_name}' is unavailable: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("column '{column}' in table '{table}' is not numeric")]
    TypeMismatch { table: String, column: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("invalid schema descriptor: {0}")]
    Config(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
