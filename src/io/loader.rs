//! CSV ingestion into [`RecordTable`]s.

use crate::core::period::parse_period_with;
use crate::core::schema::SchemaDescriptor;
use crate::core::table::{RecordTable, TableBuilder};
use crate::core::value::Value;
use crate::error::{AnalyticsError, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load a CSV file into a table named `name`.
///
/// A missing or unreadable file fails with `DataUnavailable`.
pub fn load_table(
    path: impl AsRef<Path>,
    name: &str,
    schema: &SchemaDescriptor,
) -> Result<RecordTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AnalyticsError::unavailable(path.display().to_string(), e))?;
    let table = read_table(file, name, schema)?;
    log::info!(
        "loaded '{}' from {}: {} rows, {} columns",
        name,
        path.display(),
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Read CSV from any byte source.
///
/// Column names are trimmed, and a repeated name gets a `.1`, `.2`, ...
/// suffix so every column stays addressable. The period column must match
/// `schema.period_column` exactly; when it is absent the table loads without
/// one. Rows whose period cannot be parsed are dropped.
pub fn read_table<R: Read>(reader: R, name: &str, schema: &SchemaDescriptor) -> Result<RecordTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| AnalyticsError::unavailable(name, e))?
        .iter()
        .map(clean_column_name)
        .collect();
    if columns.is_empty() {
        return Err(AnalyticsError::unavailable(name, "no header row"));
    }
    let columns = dedupe_column_names(name, columns);

    let period_idx = columns.iter().position(|c| *c == schema.period_column);
    if period_idx.is_none() {
        log::warn!(
            "'{}' has no '{}' column; period features are not available",
            name,
            schema.period_column
        );
    }

    let mut builder: TableBuilder = RecordTable::builder(name, columns.clone());
    if period_idx.is_some() {
        builder = builder.period_column(schema.period_column.clone());
    }

    let mut dropped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| AnalyticsError::unavailable(name, e))?;
        if record.len() > columns.len() {
            return Err(AnalyticsError::unavailable(
                name,
                format!(
                    "record {} has {} fields but the header has {}",
                    line + 1,
                    record.len(),
                    columns.len()
                ),
            ));
        }

        let mut period = None;
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let cell = record.get(idx).unwrap_or("");
            if Some(idx) == period_idx {
                match parse_period_with(cell, schema.day_first) {
                    Some(p) => {
                        period = Some(p);
                        values.push(Value::Period(p));
                    }
                    None => break,
                }
            } else {
                values.push(Value::from_cell(cell));
            }
        }

        if period_idx.is_some() && period.is_none() {
            log::debug!("'{}' record {}: unparseable period, dropped", name, line + 1);
            dropped += 1;
            continue;
        }
        builder.push(period, values);
    }

    if dropped > 0 {
        log::warn!("'{}': dropped {} rows with unparseable periods", name, dropped);
    }
    builder.build()
}

fn clean_column_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// `Other, Other` becomes `Other, Other.1`; the first occurrence keeps its name.
fn dedupe_column_names(table: &str, columns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(columns.len());
    columns
        .into_iter()
        .map(|column| {
            let mut candidate = column.clone();
            let mut n = 0;
            while seen.contains(&candidate) {
                n += 1;
                candidate = format!("{}.{}", column, n);
            }
            if n > 0 {
                log::warn!(
                    "'{}': duplicate column '{}' renamed to '{}'",
                    table,
                    column,
                    candidate
                );
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::total;
    use crate::core::value::Metric;
    use chrono::NaiveDate;

    const ASSETS: &str = "\u{feff}End of Period , Cash on Hand,Total Loans and Advances,Region\n\
        2020-01-31,100,1000,North\n\
        not-a-date,5,5,South\n\
        2020-02-29,150,,North\n";

    #[test]
    fn test_read_cleans_headers_and_drops_bad_periods() {
        let table = read_table(ASSETS.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(
            table.columns(),
            &["End of Period", "Cash on Hand", "Total Loans and Advances", "Region"]
        );
        assert_eq!(table.period_column(), Some("End of Period"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].period(), NaiveDate::from_ymd_opt(2020, 2, 29));
        assert_eq!(table.rows()[1].values()[2], Value::Missing);
        assert_eq!(
            table.numeric_columns(),
            vec!["Cash on Hand".to_string(), "Total Loans and Advances".to_string()]
        );
    }

    #[test]
    fn test_missing_period_column_degrades() {
        let csv = "Cash,Deposits\n1,2\n3,4\n";
        let table = read_table(csv.as_bytes(), "Liabilities", &SchemaDescriptor::default()).unwrap();
        assert!(!table.has_period());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_short_records_padded_with_missing() {
        let csv = "End of Period,Cash,Deposits\n2020-01-31,1\n";
        let table = read_table(csv.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(table.rows()[0].values()[2], Value::Missing);
    }

    #[test]
    fn test_long_record_is_malformed() {
        let csv = "End of Period,Cash\n2020-01-31,1,2,3\n";
        let err = read_table(csv.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let csv = "End of Period,Other,Other, Other\n2020-01-31,1,10,100\n";
        let table = read_table(csv.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(
            table.numeric_columns(),
            vec!["Other".to_string(), "Other.1".to_string(), "Other.2".to_string()]
        );
        let sum = total(&table, &table.numeric_columns()).unwrap();
        assert_eq!(sum, Metric::Available(111.0));
    }

    #[test]
    fn test_renamed_header_does_not_collide() {
        let csv = "End of Period,Other,Other.1,Other\n2020-01-31,1,2,3\n";
        let table = read_table(csv.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(table.columns(), &["End of Period", "Other", "Other.1", "Other.2"]);
    }

    #[test]
    fn test_month_first_dates_kept() {
        let csv = "End of Period,Cash\n01/31/2020,1\n02/29/2020,2\n03/01/2020,3\n";
        let table = read_table(csv.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(
            table.periods(),
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_day_first_schema() {
        let schema = SchemaDescriptor {
            day_first: true,
            ..SchemaDescriptor::default()
        };
        let csv = "End of Period,Cash\n01/02/2020,1\n31/03/2020,2\n";
        let table = read_table(csv.as_bytes(), "Assets", &schema).unwrap();
        assert_eq!(
            table.periods(),
            vec![
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 3, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_table(
            "/definitely/not/here.csv",
            "Assets",
            &SchemaDescriptor::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));
    }
}
