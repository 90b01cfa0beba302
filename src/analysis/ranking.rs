//! Top-N / bottom-N records by row total.

use crate::core::table::{RecordTable, Row};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One column's cell in a ranked record; `None` for a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub column: String,
    pub value: Option<f64>,
}

/// A ranked record: its source position, period, row total and the values
/// of the columns the user is looking at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub position: usize,
    pub period: Option<chrono::NaiveDate>,
    pub row_total: f64,
    pub values: Vec<ColumnValue>,
}

/// Sum of the numeric cells of one row over the given column indices.
pub fn row_total(row: &Row, indices: &[usize]) -> f64 {
    indices
        .iter()
        .filter_map(|&i| row.get(i).and_then(|v| v.as_number()))
        .sum()
}

/// Row indices ordered by descending row total; equal totals keep source order.
fn descending_order(table: &RecordTable, rank_by: &[String]) -> Result<Option<Vec<(usize, f64)>>> {
    let indices = table.numeric_indices(rank_by)?;
    if indices.is_empty() {
        return Ok(None);
    }
    let mut order: Vec<(usize, f64)> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, r)| (i, row_total(r, &indices)))
        .collect();
    // stable: ties stay in row order
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(Some(order))
}

/// The `n` rows with the largest row totals, largest first.
///
/// Returns `None` when `rank_by` is empty.
pub fn top_n(table: &RecordTable, n: usize, rank_by: &[String]) -> Result<Option<RecordTable>> {
    Ok(descending_order(table, rank_by)?.map(|order| {
        let picked: Vec<usize> = order.iter().take(n).map(|(i, _)| *i).collect();
        table.select_rows(&picked)
    }))
}

/// The `n` rows with the smallest row totals, smallest first.
///
/// Taken from the tail of the same ordering as [`top_n`], so the two results
/// never share a row while `2 * n <= table.len()`. Ties therefore come out in
/// reverse source order: among equal totals the later row is listed first.
pub fn bottom_n(table: &RecordTable, n: usize, rank_by: &[String]) -> Result<Option<RecordTable>> {
    Ok(descending_order(table, rank_by)?.map(|order| {
        let picked: Vec<usize> = order.iter().rev().take(n).map(|(i, _)| *i).collect();
        table.select_rows(&picked)
    }))
}

/// Summaries of a ranked table, carrying the values of the `show` columns.
pub fn ranked_rows(table: &RecordTable, rank_by: &[String], show: &[String]) -> Result<Vec<RankedRow>> {
    let indices = table.numeric_indices(rank_by)?;
    let shown = table.numeric_indices(show)?;
    Ok(table
        .rows()
        .iter()
        .map(|r| RankedRow {
            position: r.position(),
            period: r.period(),
            row_total: row_total(r, &indices),
            values: show
                .iter()
                .zip(&shown)
                .map(|(column, &i)| ColumnValue {
                    column: column.clone(),
                    value: r.get(i).and_then(|v| v.as_number()),
                })
                .collect(),
        })
        .collect())
}
