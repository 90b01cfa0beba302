//! # balance-sheet-analytics
//!
//! Aggregation and derived-metrics pipeline for banking-system balance sheets.
//!
//! Loads an assets table and a liabilities table, filters them by reporting
//! period, and computes what a dashboard renders: category totals, averages,
//! growth rates, asset-to-liability ratios, correlations and top/bottom
//! records.
//!
//! ## Architecture
//!
//! - **core**: Tables, cell values, periods, schema descriptor, filter context
//! - **io**: CSV loading and export of filtered views
//! - **analysis**: Classification, aggregation, ranking, growth, correlation
//! - **pipeline**: One parametrised pipeline producing a dashboard report
//! - **simulation**: Synthetic balance sheets for benchmarks and demos

pub mod analysis;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::classifier::{classify, CategoryMap};
    pub use crate::core::filter::{Dataset, FilterContext};
    pub use crate::core::schema::{AverageMode, CategoryRule, SchemaDescriptor, TotalMode};
    pub use crate::core::table::RecordTable;
    pub use crate::core::value::{Metric, Unavailable, Value};
    pub use crate::error::{AnalyticsError, Result};
    pub use crate::pipeline::dashboard::Dashboard;
    pub use crate::pipeline::report::DashboardReport;
}
