use crate::core::table::RecordTable;
use crate::core::value::{Metric, Unavailable};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Pairwise Pearson correlations, indexed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Square and symmetric; `cells[i][j]` correlates `columns[i]` with `columns[j]`.
    pub cells: Vec<Vec<Metric>>,
    /// Number of rows where both columns have a value.
    pub sample_sizes: Vec<Vec<usize>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<Metric> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.cells[i][j])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Two columns whose correlation exceeds a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongPair {
    pub column_a: String,
    pub column_b: String,
    pub correlation: f64,
}

/// Pearson correlation matrix over `columns`.
///
/// Each pair uses only the rows where both columns have a value. Fewer than
/// two such rows gives `InsufficientData`; a constant column gives
/// `ZeroVariance`. The diagonal is exactly 1 for any column with variance.
pub fn correlation_matrix(table: &RecordTable, columns: &[String]) -> Result<CorrelationMatrix> {
    let indices = table.numeric_indices(columns)?;
    let n = indices.len();
    let series: Vec<Vec<Option<f64>>> = indices
        .iter()
        .map(|&idx| {
            table
                .rows()
                .iter()
                .map(|r| r.values()[idx].as_number())
                .collect()
        })
        .collect();

    let mut cells = vec![vec![Metric::Unavailable(Unavailable::InsufficientData); n]; n];
    let mut sample_sizes = vec![vec![0usize; n]; n];

    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = series[i]
                .iter()
                .zip(&series[j])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip();
            let mut cell = pearson(&xs, &ys);
            if i == j && cell.is_available() {
                cell = Metric::Available(1.0);
            }
            cells[i][j] = cell;
            cells[j][i] = cell;
            sample_sizes[i][j] = xs.len();
            sample_sizes[j][i] = xs.len();
        }
    }

    log::debug!(
        "correlation matrix over {} columns, {} rows of '{}'",
        n,
        table.len(),
        table.name()
    );
    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        cells,
        sample_sizes,
    })
}

/// Every unordered pair (no self-pairs) with `|r| > threshold`, in matrix order.
pub fn strong_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<StrongPair> {
    let mut pairs = Vec::new();
    for i in 0..matrix.len() {
        for j in (i + 1)..matrix.len() {
            if let Some(r) = matrix.cells[i][j].value() {
                if r.abs() > threshold {
                    pairs.push(StrongPair {
                        column_a: matrix.columns[i].clone(),
                        column_b: matrix.columns[j].clone(),
                        correlation: r,
                    });
                }
            }
        }
    }
    pairs
}

/// Correlation of every other column with `reference`, most negative first.
/// Unavailable correlations are left out.
pub fn correlations_with(matrix: &CorrelationMatrix, reference: &str) -> Result<Vec<(String, f64)>> {
    let i = matrix
        .columns
        .iter()
        .position(|c| c == reference)
        .ok_or_else(|| AnalyticsError::ColumnNotFound {
            table: "correlation matrix".to_string(),
            column: reference.to_string(),
        })?;

    let mut out: Vec<(String, f64)> = matrix
        .columns
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .filter_map(|(j, c)| matrix.cells[i][j].value().map(|r| (c.clone(), r)))
        .collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(out)
}

fn pearson(xs: &[f64], ys: &[f64]) -> Metric {
    let n = xs.len();
    if n < 2 {
        return Metric::Unavailable(Unavailable::InsufficientData);
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Metric::Unavailable(Unavailable::ZeroVariance);
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Metric::finite_or(r.clamp(-1.0, 1.0), Unavailable::ZeroVariance)
}
