use crate::analysis::aggregation::{
    average_with, biggest_contributor, category_totals, composition, total,
};
use crate::analysis::classifier::classify;
use crate::analysis::correlation::{correlation_matrix, strong_pairs};
use crate::analysis::growth::{aligned_ratio, period_series, period_totals, PeriodMetric};
use crate::analysis::ranking::{bottom_n, ranked_rows, top_n, RankedRow};
use crate::analysis::summary::summarize;
use crate::core::filter::{filter_table, Dataset, FilterContext};
use crate::core::schema::SchemaDescriptor;
use crate::core::table::RecordTable;
use crate::error::Result;
use crate::io::loader::load_table;
use crate::pipeline::report::{DashboardReport, GrowthSeries};
use std::path::Path;

/// The two loaded tables and the schema describing them.
///
/// Tables are loaded once and never modified; every call to
/// [`Dashboard::analyze`] works on a fresh filtered copy.
///
/// # Examples
///
/// ```
/// use balance_sheet_analytics::core::filter::{Dataset, FilterContext};
/// use balance_sheet_analytics::core::schema::SchemaDescriptor;
/// use balance_sheet_analytics::io::loader::read_table;
/// use balance_sheet_analytics::pipeline::dashboard::Dashboard;
///
/// let schema = SchemaDescriptor::default();
/// let assets = read_table(
///     "End of Period,Cash on Hand,Investments\n2020-01-31,100,50\n2020-02-29,150,50\n".as_bytes(),
///     "Assets",
///     &schema,
/// ).unwrap();
/// let liabilities = read_table(
///     "End of Period,Deposits\n2020-01-31,120\n2020-02-29,100\n".as_bytes(),
///     "Liabilities",
///     &schema,
/// ).unwrap();
///
/// let dashboard = Dashboard::new(assets, liabilities, schema);
/// let report = dashboard.analyze(&FilterContext::new(Dataset::Assets).with_year(2020)).unwrap();
/// assert_eq!(report.total.value(), Some(350.0));
/// assert_eq!(report.asset_liability_ratio[1].value.value(), Some(2.0));
/// ```
#[derive(Debug, Clone)]
pub struct Dashboard {
    assets: RecordTable,
    liabilities: RecordTable,
    schema: SchemaDescriptor,
}

impl Dashboard {
    pub fn new(assets: RecordTable, liabilities: RecordTable, schema: SchemaDescriptor) -> Self {
        Self {
            assets,
            liabilities,
            schema,
        }
    }

    /// Load both CSV sources. Either one being unavailable fails the session.
    pub fn load(
        assets_path: impl AsRef<Path>,
        liabilities_path: impl AsRef<Path>,
        schema: SchemaDescriptor,
    ) -> Result<Self> {
        let assets = load_table(assets_path, "Assets", &schema)?;
        let liabilities = load_table(liabilities_path, "Liabilities", &schema)?;
        Ok(Self::new(assets, liabilities, schema))
    }

    pub fn table(&self, dataset: Dataset) -> &RecordTable {
        match dataset {
            Dataset::Assets => &self.assets,
            Dataset::Liabilities => &self.liabilities,
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// The exact view [`Dashboard::analyze`] computes over, e.g. for export.
    pub fn filtered(&self, ctx: &FilterContext) -> Result<RecordTable> {
        ctx.validate()?;
        let mut notes = Vec::new();
        Ok(view(self.table(ctx.dataset), ctx, &mut notes))
    }

    /// Run the full pipeline for one filter selection.
    ///
    /// Only invalid parameters are errors. Anything a table cannot support
    /// (no period column, unknown or non-numeric selected columns, no numeric
    /// data) leaves that part of the report empty and adds a note.
    pub fn analyze(&self, ctx: &FilterContext) -> Result<DashboardReport> {
        ctx.validate()?;
        let mut notes = Vec::new();

        let table = view(self.table(ctx.dataset), ctx, &mut notes);
        let numeric = table.numeric_columns();
        if numeric.is_empty() {
            notes.push(format!("'{}' has no numeric columns", table.name()));
        }
        let total_columns = self.schema.total_mode.select(&numeric);

        // numeric columns only, so none of these can be a type mismatch
        let total_value = total(&table, &total_columns)?;
        let average = average_with(&table, &numeric, self.schema.average_mode)?;
        let contributor = biggest_contributor(&table, &numeric)?;
        let categories = classify(&numeric, &self.schema.categories);
        let cat_totals = category_totals(&table, &categories)?;
        let shares = composition(&table, &numeric)?;

        let selected = selected_columns(&table, &numeric, ctx, &mut notes);

        let summary = match selected.first() {
            Some(col) if table.has_period() => Some(summarize(&table, col)?),
            _ => None,
        };

        let mut growth = Vec::new();
        if table.has_period() {
            for col in &selected {
                let series = period_series(&table, col)?;
                growth.push(GrowthSeries {
                    column: col.clone(),
                    lag: ctx.lag,
                    points: series.growth(ctx.lag)?,
                });
            }
        } else if !selected.is_empty() {
            notes.push("growth rates not available: no period column".to_string());
        }

        let asset_liability_ratio = self.asset_liability_ratio(ctx, &mut notes)?;

        let (correlation, pairs) = if numeric.is_empty() {
            (None, Vec::new())
        } else {
            let matrix = correlation_matrix(&table, &numeric)?;
            let pairs = strong_pairs(&matrix, ctx.threshold);
            (Some(matrix), pairs)
        };

        let top = ranked(top_n(&table, ctx.top_n, &numeric)?, &numeric, &selected)?;
        let bottom = ranked(bottom_n(&table, ctx.top_n, &numeric)?, &numeric, &selected)?;

        log::info!(
            "analyzed {} ({} rows, {} numeric columns, {} notes)",
            ctx.dataset,
            table.len(),
            numeric.len(),
            notes.len()
        );

        Ok(DashboardReport {
            dataset: ctx.dataset,
            filter: ctx.clone(),
            row_count: table.len(),
            numeric_columns: numeric,
            total_columns,
            total: total_value,
            average,
            biggest_contributor: contributor,
            categories,
            category_totals: cat_totals,
            composition: shares,
            summary,
            growth,
            asset_liability_ratio,
            correlation,
            strong_pairs: pairs,
            top,
            bottom,
            notes,
        })
    }

    /// Per-period total assets over total liabilities, both filtered by `ctx`.
    fn asset_liability_ratio(
        &self,
        ctx: &FilterContext,
        notes: &mut Vec<String>,
    ) -> Result<Vec<PeriodMetric>> {
        let assets = view(&self.assets, ctx, notes);
        let liabilities = view(&self.liabilities, ctx, notes);
        if !assets.has_period() || !liabilities.has_period() {
            notes.push("asset/liability ratio not available: missing period column".to_string());
            return Ok(Vec::new());
        }

        let asset_cols = self.schema.total_mode.select(&assets.numeric_columns());
        let liability_cols = self.schema.total_mode.select(&liabilities.numeric_columns());
        if asset_cols.is_empty() || liability_cols.is_empty() {
            notes.push("asset/liability ratio not available: no total columns".to_string());
            return Ok(Vec::new());
        }

        let a = period_totals(&assets, &asset_cols, "Total Assets")?;
        let l = period_totals(&liabilities, &liability_cols, "Total Liabilities")?;
        Ok(aligned_ratio(&a, &l))
    }
}

/// Filter `table`, falling back to the whole table when it has no period
/// column to filter on.
fn view(table: &RecordTable, ctx: &FilterContext, notes: &mut Vec<String>) -> RecordTable {
    match filter_table(table, ctx) {
        Ok(t) => t,
        Err(e) => {
            let note = format!("period filter skipped for '{}': {}", table.name(), e);
            if !notes.contains(&note) {
                log::warn!("{}", note);
                notes.push(note);
            }
            table.clone()
        }
    }
}

/// The user's column selection restricted to usable numeric columns, or the
/// first numeric column when nothing was selected.
fn selected_columns(
    table: &RecordTable,
    numeric: &[String],
    ctx: &FilterContext,
    notes: &mut Vec<String>,
) -> Vec<String> {
    let Some(requested) = &ctx.columns else {
        return numeric.iter().take(1).cloned().collect();
    };
    requested
        .iter()
        .filter(|c| match table.is_numeric(c) {
            Ok(true) => true,
            Ok(false) => {
                notes.push(format!("column '{}' is not numeric; skipped", c));
                false
            }
            Err(_) => {
                notes.push(format!("column '{}' not found; skipped", c));
                false
            }
        })
        .cloned()
        .collect()
}

fn ranked(table: Option<RecordTable>, rank_by: &[String], show: &[String]) -> Result<Vec<RankedRow>> {
    match table {
        Some(t) => ranked_rows(&t, rank_by, show),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::{Metric, Unavailable};
    use crate::error::AnalyticsError;
    use crate::io::loader::read_table;

    const ASSETS: &str = "End of Period,Cash on Hand,Total Loans and Advances,Investments,Region\n\
        2019-12-31,90,900,10,North\n\
        2020-01-31,100,1000,20,North\n\
        2020-02-29,150,1100,20,South\n\
        2020-03-31,120,1150,40,South\n";

    const LIABILITIES: &str = "End of Period,Deposits,Borrowings\n\
        2020-01-31,800,200\n\
        2020-02-29,900,0\n\
        2020-04-30,950,50\n";

    fn dashboard() -> Dashboard {
        let schema = SchemaDescriptor::default();
        let assets = read_table(ASSETS.as_bytes(), "Assets", &schema).unwrap();
        let liabilities = read_table(LIABILITIES.as_bytes(), "Liabilities", &schema).unwrap();
        Dashboard::new(assets, liabilities, schema)
    }

    #[test]
    fn test_year_report() {
        let d = dashboard();
        let report = d.analyze(&FilterContext::new(Dataset::Assets).with_year(2020)).unwrap();
        assert_eq!(report.row_count, 3);
        assert_eq!(report.total, Metric::Available(3700.0));
        assert_eq!(
            report.biggest_contributor.as_deref(),
            Some("Total Loans and Advances")
        );
        assert_eq!(report.numeric_columns.len(), 3);
        assert!(report.notes.is_empty());
        // source table untouched
        assert_eq!(d.table(Dataset::Assets).len(), 4);
    }

    #[test]
    fn test_categories_in_report() {
        let report = dashboard().analyze(&FilterContext::new(Dataset::Assets)).unwrap();
        let cash = report
            .category_totals
            .iter()
            .find(|c| c.name == "Cash and Balances")
            .unwrap();
        assert_eq!(cash.total, Metric::Available(460.0));
        let deposits = report
            .category_totals
            .iter()
            .find(|c| c.name == "Deposits")
            .unwrap();
        assert_eq!(deposits.total, Metric::Unavailable(Unavailable::NoMatchingColumns));
    }

    #[test]
    fn test_ratio_is_period_aligned() {
        let report = dashboard().analyze(&FilterContext::new(Dataset::Assets)).unwrap();
        // only Jan and Feb 2020 appear in both tables
        assert_eq!(report.asset_liability_ratio.len(), 2);
        assert_eq!(report.asset_liability_ratio[0].value, Metric::Available(1.12));
        assert_eq!(report.asset_liability_ratio[1].value, Metric::Available(1270.0 / 900.0));
    }

    #[test]
    fn test_growth_for_selected_columns() {
        let ctx = FilterContext::new(Dataset::Assets)
            .with_columns(vec!["Cash on Hand".into(), "Region".into(), "Nope".into()]);
        let report = dashboard().analyze(&ctx).unwrap();
        assert_eq!(report.growth.len(), 1);
        let g = &report.growth[0];
        assert_eq!(g.points[0].value, Metric::Unavailable(Unavailable::NoPriorValue));
        assert_eq!(g.points[2].value, Metric::Available(50.0));
        assert_eq!(report.notes.len(), 2);
    }

    #[test]
    fn test_top_bottom_disjoint() {
        let report = dashboard()
            .analyze(&FilterContext::new(Dataset::Assets).with_top_n(2))
            .unwrap();
        let top: Vec<usize> = report.top.iter().map(|r| r.position).collect();
        let bottom: Vec<usize> = report.bottom.iter().map(|r| r.position).collect();
        assert_eq!(top, vec![3, 2]);
        assert_eq!(bottom, vec![0, 1]);
    }

    #[test]
    fn test_ranked_records_show_selected_values() {
        let ctx = FilterContext::new(Dataset::Assets)
            .with_top_n(1)
            .with_columns(vec!["Investments".into(), "Cash on Hand".into()]);
        let report = dashboard().analyze(&ctx).unwrap();
        let columns: Vec<&str> = report.top[0].values.iter().map(|v| v.column.as_str()).collect();
        assert_eq!(columns, vec!["Investments", "Cash on Hand"]);
        // 2020-03-31 has the largest row total
        assert_eq!(report.top[0].values[0].value, Some(40.0));
        assert_eq!(report.top[0].values[1].value, Some(120.0));
        assert_eq!(report.bottom[0].values[1].value, Some(90.0));
    }

    #[test]
    fn test_missing_period_column_degrades() {
        let schema = SchemaDescriptor::default();
        let assets = read_table("Cash,Investments\n1,2\n3,4\n".as_bytes(), "Assets", &schema).unwrap();
        let liabilities = read_table(LIABILITIES.as_bytes(), "Liabilities", &schema).unwrap();
        let d = Dashboard::new(assets, liabilities, schema);

        let report = d.analyze(&FilterContext::new(Dataset::Assets).with_year(2020)).unwrap();
        assert_eq!(report.row_count, 2);
        assert_eq!(report.total, Metric::Available(10.0));
        assert!(report.summary.is_none());
        assert!(report.growth.is_empty());
        assert!(report.asset_liability_ratio.is_empty());
        assert!(report.notes.iter().any(|n| n.contains("period filter skipped")));
    }

    #[test]
    fn test_invalid_context_rejected() {
        let err = dashboard()
            .analyze(&FilterContext::new(Dataset::Assets).with_lag(0))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
    }

    #[test]
    fn test_filtered_matches_report_rows() {
        let d = dashboard();
        let ctx = FilterContext::new(Dataset::Liabilities).with_year(2020).with_month(2);
        let view = d.filtered(&ctx).unwrap();
        let report = d.analyze(&ctx).unwrap();
        assert_eq!(view.len(), report.row_count);
        assert_eq!(view.len(), 1);
    }
}
