use crate::analysis::classifier::CategoryMap;
use crate::core::schema::AverageMode;
use crate::core::table::RecordTable;
use crate::core::value::{Metric, Unavailable};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A named total, e.g. one category or one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTotal {
    pub name: String,
    pub total: Metric,
}

/// One slice of a composition (pie / bar) breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub column: String,
    pub total: f64,
    /// Percentage of the sum over all columns; unavailable when that sum is zero.
    pub percent: Metric,
}

/// Sum of every value in `columns` across all rows.
///
/// Missing cells are skipped. Non-numeric columns fail with `TypeMismatch`;
/// an empty column list yields `Unavailable(NoNumericColumns)`.
pub fn total(table: &RecordTable, columns: &[String]) -> Result<Metric> {
    let indices = table.numeric_indices(columns)?;
    if indices.is_empty() {
        return Ok(Metric::Unavailable(Unavailable::NoNumericColumns));
    }
    let sum = table
        .rows()
        .iter()
        .flat_map(|r| indices.iter().filter_map(move |&i| r.values()[i].as_number()))
        .sum();
    Ok(Metric::Available(sum))
}

/// Mean of the per-column means.
///
/// Columns with no values contribute no mean. This differs from the
/// flattened mean whenever columns have unequal value counts; see
/// [`average_with`] for the alternate convention.
pub fn average(table: &RecordTable, columns: &[String]) -> Result<Metric> {
    average_with(table, columns, AverageMode::PerColumnMean)
}

pub fn average_with(table: &RecordTable, columns: &[String], mode: AverageMode) -> Result<Metric> {
    let indices = table.numeric_indices(columns)?;
    if indices.is_empty() {
        return Ok(Metric::Unavailable(Unavailable::NoNumericColumns));
    }

    let per_column: Vec<(f64, usize)> = indices
        .iter()
        .map(|&i| {
            table
                .rows()
                .iter()
                .filter_map(|r| r.values()[i].as_number())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1))
        })
        .collect();

    let result = match mode {
        AverageMode::PerColumnMean => {
            let means: Vec<f64> = per_column
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(s, n)| s / *n as f64)
                .collect();
            mean(&means)
        }
        AverageMode::Flattened => {
            let (sum, count) = per_column
                .iter()
                .fold((0.0, 0usize), |(s, n), (cs, cn)| (s + cs, n + cn));
            (count > 0).then(|| sum / count as f64)
        }
    };

    Ok(result
        .map(Metric::Available)
        .unwrap_or(Metric::Unavailable(Unavailable::InsufficientData)))
}

/// Sum of each column, in the order given.
pub fn column_totals(table: &RecordTable, columns: &[String]) -> Result<Vec<(String, f64)>> {
    let indices = table.numeric_indices(columns)?;
    Ok(columns
        .iter()
        .zip(indices)
        .map(|(c, i)| {
            let sum = table
                .rows()
                .iter()
                .filter_map(|r| r.values()[i].as_number())
                .sum();
            (c.clone(), sum)
        })
        .collect())
}

/// The column with the largest sum; the first one wins a tie.
/// `None` when no columns are given.
pub fn biggest_contributor(table: &RecordTable, columns: &[String]) -> Result<Option<String>> {
    let totals = column_totals(table, columns)?;
    let mut best: Option<(String, f64)> = None;
    for (name, sum) in totals {
        if best.as_ref().map_or(true, |(_, b)| sum > *b) {
            best = Some((name, sum));
        }
    }
    Ok(best.map(|(name, _)| name))
}

/// Total of each category over the rows of `table`.
///
/// Empty categories are reported as `Unavailable(NoMatchingColumns)`.
pub fn category_totals(table: &RecordTable, categories: &CategoryMap) -> Result<Vec<NamedTotal>> {
    categories
        .categories()
        .iter()
        .map(|cat| {
            let total = if cat.is_empty() {
                Metric::Unavailable(Unavailable::NoMatchingColumns)
            } else {
                total(table, &cat.columns)?
            };
            Ok(NamedTotal {
                name: cat.name.clone(),
                total,
            })
        })
        .collect()
}

/// Each column's share of the combined sum, for pie and bar breakdowns.
pub fn composition(table: &RecordTable, columns: &[String]) -> Result<Vec<Share>> {
    let totals = column_totals(table, columns)?;
    let grand: f64 = totals.iter().map(|(_, t)| t).sum();
    Ok(totals
        .into_iter()
        .map(|(column, total)| {
            let percent = if grand == 0.0 {
                Metric::Unavailable(Unavailable::DivisionByZero)
            } else {
                Metric::finite_or(total / grand * 100.0, Unavailable::DivisionByZero)
            };
            Share {
                column,
                total,
                percent,
            }
        })
        .collect())
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
