//! Export of a filtered view as delimited text, JSON or an xlsx workbook.
//!
//! The output reproduces exactly the rows and columns of the table it is
//! given, so exporting the view a report was computed from yields the same
//! data the report describes.

use crate::core::table::RecordTable;
use crate::core::value::Value;
use crate::error::{AnalyticsError, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value as JsonValue};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Output encoding for [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Write the table as CSV: one header row, periods as `YYYY-MM-DD`,
/// missing cells empty.
pub fn write_csv<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(table.columns()).map_err(export_err)?;
    for row in table.rows() {
        wtr.write_record(row.values().iter().map(|v| v.to_string()))
            .map_err(export_err)?;
    }
    wtr.flush().map_err(export_err)?;
    Ok(())
}

/// Write the table as a JSON array of objects keyed by column name.
pub fn write_json<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let records: Vec<JsonValue> = table
        .rows()
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (column, value) in table.columns().iter().zip(row.values()) {
                obj.insert(column.clone(), to_json(value));
            }
            JsonValue::Object(obj)
        })
        .collect();
    serde_json::to_writer_pretty(writer, &records).map_err(export_err)
}

/// Write the table as an xlsx workbook with one sheet named after the table.
///
/// Cells match [`write_csv`]: a header row, numbers as numbers, periods as
/// `YYYY-MM-DD` text and missing cells left blank.
pub fn write_xlsx<W: Write>(table: &RecordTable, mut writer: W) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&sheet_name(table.name())).map_err(export_err)?;

    for (col, column) in table.columns().iter().enumerate() {
        sheet
            .write_string(0, cell_col(col)?, column.as_str())
            .map_err(export_err)?;
    }
    for (i, row) in table.rows().iter().enumerate() {
        let r = u32::try_from(i + 1).map_err(export_err)?;
        for (col, value) in row.values().iter().enumerate() {
            let c = cell_col(col)?;
            let written = match value {
                Value::Number(n) => sheet.write_number(r, c, *n).map(|_| ()),
                Value::Missing => Ok(()),
                other => sheet.write_string(r, c, &other.to_string()).map(|_| ()),
            };
            written.map_err(export_err)?;
        }
    }

    let bytes = workbook.save_to_buffer().map_err(export_err)?;
    writer.write_all(&bytes).map_err(export_err)
}

/// Export to a file in the given format.
pub fn export(table: &RecordTable, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(export_err)?;
    match format {
        ExportFormat::Csv => write_csv(table, file)?,
        ExportFormat::Json => write_json(table, file)?,
        ExportFormat::Xlsx => write_xlsx(table, file)?,
    }
    log::info!(
        "exported {} rows of '{}' to {}",
        table.len(),
        table.name(),
        path.display()
    );
    Ok(())
}

/// Conventional download name, e.g. `Assets_2020.csv`.
pub fn export_file_name(table_name: &str, year: Option<i32>, format: ExportFormat) -> String {
    match year {
        Some(y) => format!("{}_{}.{}", table_name, y, format.extension()),
        None => format!("{}.{}", table_name, format.extension()),
    }
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Period(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Missing => JsonValue::Null,
    }
}

fn cell_col(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(export_err)
}

/// Worksheet names are at most 31 characters and exclude `[]:*?/\\`.
fn sheet_name(table_name: &str) -> String {
    let cleaned: String = table_name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn export_err(e: impl ToString) -> AnalyticsError {
    AnalyticsError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::SchemaDescriptor;
    use crate::io::loader::read_table;

    const CSV: &str = "End of Period,Cash,Region\n2020-01-31,100.5,North\n2020-02-29,,South\n";

    fn table() -> RecordTable {
        read_table(CSV.as_bytes(), "Assets", &SchemaDescriptor::default()).unwrap()
    }

    #[test]
    fn test_csv_export_reproduces_view() {
        let mut buf = Vec::new();
        write_csv(&table(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), CSV);
    }

    #[test]
    fn test_csv_export_reloads_identically() {
        let original = table();
        let mut buf = Vec::new();
        write_csv(&original, &mut buf).unwrap();
        let reloaded = read_table(buf.as_slice(), "Assets", &SchemaDescriptor::default()).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_json_export() {
        let mut buf = Vec::new();
        write_json(&table(), &mut buf).unwrap();
        let parsed: JsonValue = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed[0]["Cash"], 100.5);
        assert_eq!(parsed[0]["End of Period"], "2020-01-31");
        assert!(parsed[1]["Cash"].is_null());
    }

    #[test]
    fn test_xlsx_export_is_a_workbook() {
        let mut buf = Vec::new();
        write_xlsx(&table(), &mut buf).unwrap();
        // xlsx is a zip container
        assert!(buf.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_xlsx_export_to_file() {
        let path = std::env::temp_dir().join(format!("bsa-export-{}.xlsx", std::process::id()));
        export(&table(), &path, ExportFormat::Xlsx).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 4 && bytes.starts_with(b"PK"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_sheet_name_cleaned() {
        assert_eq!(sheet_name("Assets"), "Assets");
        assert_eq!(sheet_name("Assets [2020/21]"), "Assets _2020_21_");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("''"), "Sheet1");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(export_file_name("Assets", Some(2020), ExportFormat::Xlsx), "Assets_2020.xlsx");
        assert_eq!(export_file_name("Assets", Some(2020), ExportFormat::Csv), "Assets_2020.csv");
        assert_eq!(export_file_name("Liabilities", None, ExportFormat::Json), "Liabilities.json");
    }
}
