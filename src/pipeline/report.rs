use crate::analysis::aggregation::{NamedTotal, Share};
use crate::analysis::classifier::CategoryMap;
use crate::analysis::correlation::{CorrelationMatrix, StrongPair};
use crate::analysis::growth::PeriodMetric;
use crate::analysis::ranking::RankedRow;
use crate::analysis::summary::PeriodSummary;
use crate::core::filter::{Dataset, FilterContext};
use crate::core::value::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Growth of one column over the configured lag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    pub column: String,
    pub lag: usize,
    pub points: Vec<PeriodMetric>,
}

/// Everything the presentation shell renders for one filter selection.
///
/// Features that could not be computed are left empty (or `None`) and
/// explained in `notes`; a report is always complete in shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub dataset: Dataset,
    pub filter: FilterContext,
    pub row_count: usize,
    pub numeric_columns: Vec<String>,
    /// Columns counted toward `total`.
    pub total_columns: Vec<String>,
    pub total: Metric,
    pub average: Metric,
    pub biggest_contributor: Option<String>,
    pub categories: CategoryMap,
    pub category_totals: Vec<NamedTotal>,
    pub composition: Vec<Share>,
    pub summary: Option<PeriodSummary>,
    pub growth: Vec<GrowthSeries>,
    /// Total assets over total liabilities for the periods both tables share.
    pub asset_liability_ratio: Vec<PeriodMetric>,
    pub correlation: Option<CorrelationMatrix>,
    pub strong_pairs: Vec<StrongPair>,
    pub top: Vec<RankedRow>,
    pub bottom: Vec<RankedRow>,
    pub notes: Vec<String>,
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match (self.filter.year, self.filter.month) {
            (Some(y), Some(m)) => format!("{}-{:02}", y, m),
            (Some(y), None) => y.to_string(),
            (None, Some(m)) => format!("month {:02}", m),
            (None, None) => "all periods".to_string(),
        };
        writeln!(f, "=== {} Overview ({}) ===", self.dataset, scope)?;
        writeln!(f, "Rows:                {}", self.row_count)?;
        writeln!(f, "Total Value:         {:.0}", self.total)?;
        writeln!(f, "Average per Metric:  {:.2}", self.average)?;
        writeln!(
            f,
            "Top Contributor:     {}",
            self.biggest_contributor.as_deref().unwrap_or("n/a")
        )?;

        if let Some(s) = &self.summary {
            writeln!(f, "\n--- Summary ({}) ---", s.column)?;
            if let Some(last) = s.last_period {
                writeln!(
                    f,
                    "  Last:      {}: {:.2} (delta {:.2})",
                    last.format("%b %Y"),
                    s.last_value,
                    s.delta
                )?;
            }
            writeln!(f, "  Frequency: {}", s.frequency)?;
            if let Some(range) = s.range_label() {
                writeln!(f, "  Range:     {}", range)?;
            }
        }

        if !self.category_totals.is_empty() {
            writeln!(f, "\n--- Categories ---")?;
            for c in &self.category_totals {
                writeln!(f, "  {:<24} {:.0}", c.name, c.total)?;
            }
        }

        if !self.composition.is_empty() {
            writeln!(f, "\n--- Composition ---")?;
            for s in &self.composition {
                let percent = match &s.percent {
                    Metric::Available(p) => format!("{:.1}%", p),
                    other => other.to_string(),
                };
                writeln!(f, "  {:<40} {:>18.0} {:>7}", s.column, s.total, percent)?;
            }
        }

        for g in &self.growth {
            writeln!(f, "\n--- Growth: {} (lag {}) ---", g.column, g.lag)?;
            for p in &g.points {
                writeln!(f, "  {}  {:.2}", p.period, p.value)?;
            }
        }

        if !self.asset_liability_ratio.is_empty() {
            writeln!(f, "\n--- Asset / Liability Ratio ---")?;
            for p in &self.asset_liability_ratio {
                writeln!(f, "  {}  {:.4}", p.period, p.value)?;
            }
        }

        if !self.strong_pairs.is_empty() {
            writeln!(
                f,
                "\n--- Strong Correlations (|r| > {}) ---",
                self.filter.threshold
            )?;
            for p in &self.strong_pairs {
                writeln!(f, "  {} ~ {}: {:.3}", p.column_a, p.column_b, p.correlation)?;
            }
        }

        for (title, rows) in [("Top", &self.top), ("Bottom", &self.bottom)] {
            if rows.is_empty() {
                continue;
            }
            writeln!(f, "\n--- {} {} Records (by row total) ---", title, rows.len())?;
            for r in rows {
                let period = r
                    .period
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| format!("row {}", r.position));
                let values: Vec<String> = r
                    .values
                    .iter()
                    .map(|v| match v.value {
                        Some(x) => format!("{}: {:.0}", v.column, x),
                        None => format!("{}: -", v.column),
                    })
                    .collect();
                writeln!(f, "  {:<12} {:>14.0}  {}", period, r.row_total, values.join(", "))?;
            }
        }

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes:")?;
            for n in &self.notes {
                writeln!(f, "  - {}", n)?;
            }
        }
        Ok(())
    }
}
