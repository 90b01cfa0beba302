use crate::core::value::Value;
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of a [`RecordTable`].
///
/// `values` is aligned with the table's columns. `position` is the row's
/// index in the source it was loaded from and survives filtering, so
/// rankings and exports can refer back to the original record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    position: usize,
    period: Option<NaiveDate>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(position: usize, period: Option<NaiveDate>, values: Vec<Value>) -> Self {
        Self {
            position,
            period,
            values,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn period(&self) -> Option<NaiveDate> {
        self.period
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// An in-memory table of balance-sheet records.
///
/// A table is immutable once built. Filtering and ranking produce new
/// tables; the loaded table stays available for the next request.
///
/// # Examples
///
/// ```
/// use balance_sheet_analytics::core::table::RecordTable;
/// use balance_sheet_analytics::core::value::Value;
///
/// let table = RecordTable::builder("Assets", vec!["Cash".into(), "Region".into()])
///     .row(None, vec![Value::Number(10.0), Value::from("North")])
///     .row(None, vec![Value::Number(20.0), Value::Missing])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.numeric_columns(), vec!["Cash".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    name: String,
    columns: Vec<String>,
    period_column: Option<String>,
    rows: Vec<Row>,
}

impl RecordTable {
    /// Build a table, checking that column names are unique, every row
    /// matches the column count and the period column is in the header.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        period_column: Option<String>,
        rows: Vec<Row>,
    ) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "column '{}' appears more than once in '{}'",
                dup, name
            )));
        }
        if let Some(pc) = &period_column {
            if !columns.iter().any(|c| c == pc) {
                return Err(AnalyticsError::ColumnNotFound {
                    table: name,
                    column: pc.clone(),
                });
            }
        }
        if let Some(bad) = rows.iter().find(|r| r.values.len() != columns.len()) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "row {} of '{}' has {} cells, expected {}",
                bad.position,
                name,
                bad.values.len(),
                columns.len()
            )));
        }
        Ok(Self {
            name,
            columns,
            period_column,
            rows,
        })
    }

    pub fn builder(name: impl Into<String>, columns: Vec<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            columns,
            period_column: None,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn period_column(&self) -> Option<&str> {
        self.period_column.as_deref()
    }

    pub fn has_period(&self) -> bool {
        self.period_column.is_some()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, or `ColumnNotFound`.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| AnalyticsError::ColumnNotFound {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// A column is numeric when it is not the period column and every
    /// non-missing cell is a number.
    pub fn is_numeric(&self, column: &str) -> Result<bool> {
        let idx = self.column_index(column)?;
        Ok(self.is_numeric_at(idx))
    }

    fn is_numeric_at(&self, idx: usize) -> bool {
        if self.period_column.as_deref() == Some(self.columns[idx].as_str()) {
            return false;
        }
        self.rows
            .iter()
            .all(|r| matches!(r.values[idx], Value::Number(_) | Value::Missing))
    }

    /// All numeric columns, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        (0..self.columns.len())
            .filter(|&i| self.is_numeric_at(i))
            .map(|i| self.columns[i].clone())
            .collect()
    }

    /// Resolve column names to indices, rejecting absent or non-numeric ones.
    pub fn numeric_indices(&self, columns: &[String]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|c| {
                let idx = self.column_index(c)?;
                if self.is_numeric_at(idx) {
                    Ok(idx)
                } else {
                    Err(AnalyticsError::TypeMismatch {
                        table: self.name.clone(),
                        column: c.clone(),
                    })
                }
            })
            .collect()
    }

    /// Non-missing numbers of a column, in row order.
    pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
        let idx = self.numeric_indices(&[column.to_string()])?[0];
        Ok(self
            .rows
            .iter()
            .filter_map(|r| r.values[idx].as_number())
            .collect())
    }

    /// Every period present in the table, in row order.
    pub fn periods(&self) -> Vec<NaiveDate> {
        self.rows.iter().filter_map(|r| r.period).collect()
    }

    /// A new table with the same schema holding the rows matching `keep`.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            period_column: self.period_column.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// A new table holding the rows at the given indices, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            period_column: self.period_column.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Incremental construction of a [`RecordTable`]. Row positions are
/// assigned in insertion order.
pub struct TableBuilder {
    name: String,
    columns: Vec<String>,
    period_column: Option<String>,
    rows: Vec<Row>,
}

impl TableBuilder {
    pub fn period_column(mut self, column: impl Into<String>) -> Self {
        self.period_column = Some(column.into());
        self
    }

    pub fn row(mut self, period: Option<NaiveDate>, values: Vec<Value>) -> Self {
        self.push(period, values);
        self
    }

    pub fn push(&mut self, period: Option<NaiveDate>, values: Vec<Value>) {
        let position = self.rows.len();
        self.rows.push(Row::new(position, period, values));
    }

    pub fn build(self) -> Result<RecordTable> {
        RecordTable::new(self.name, self.columns, self.period_column, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordTable {
        let jan = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        let feb = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        RecordTable::builder(
            "Assets",
            vec!["End of Period".into(), "Cash".into(), "Bank".into()],
        )
        .period_column("End of Period")
        .row(Some(jan), vec![jan.into(), Value::Number(1.0), Value::from("A")])
        .row(Some(feb), vec![feb.into(), Value::Missing, Value::from("B")])
        .build()
        .unwrap()
    }

    #[test]
    fn test_numeric_detection() {
        let t = sample();
        assert_eq!(t.numeric_columns(), vec!["Cash".to_string()]);
        assert!(t.is_numeric("Cash").unwrap());
        assert!(!t.is_numeric("Bank").unwrap());
        assert!(!t.is_numeric("End of Period").unwrap());
    }

    #[test]
    fn test_numeric_indices_rejects_text() {
        let t = sample();
        let err = t.numeric_indices(&["Bank".into()]).unwrap_err();
        assert!(matches!(err, AnalyticsError::TypeMismatch { .. }));

        let err = t.numeric_indices(&["Nope".into()]).unwrap_err();
        assert!(matches!(err, AnalyticsError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_filter_keeps_positions() {
        let t = sample();
        let f = t.filter_rows(|r| r.position() == 1);
        assert_eq!(f.len(), 1);
        assert_eq!(f.rows()[0].position(), 1);
        // source untouched
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = RecordTable::builder("T", vec!["A".into(), "B".into()])
            .row(None, vec![Value::Number(1.0)])
            .build();
        assert!(matches!(result, Err(AnalyticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = RecordTable::builder("T", vec!["Other".into(), "Other".into()])
            .row(None, vec![Value::Number(1.0), Value::Number(10.0)])
            .build();
        assert!(matches!(result, Err(AnalyticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_unknown_period_column_rejected() {
        let result = RecordTable::builder("T", vec!["A".into()])
            .period_column("End of Period")
            .build();
        assert!(matches!(result, Err(AnalyticsError::ColumnNotFound { .. })));
    }
}
