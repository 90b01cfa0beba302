use approx::assert_relative_eq;
use balance_sheet_analytics::analysis::aggregation::{average, average_with, total};
use balance_sheet_analytics::analysis::classifier::classify;
use balance_sheet_analytics::analysis::correlation::{correlation_matrix, strong_pairs};
use balance_sheet_analytics::analysis::growth::{growth_rate, ratio};
use balance_sheet_analytics::core::filter::{Dataset, FilterContext};
use balance_sheet_analytics::core::schema::{AverageMode, CategoryRule, SchemaDescriptor, TotalMode};
use balance_sheet_analytics::core::table::RecordTable;
use balance_sheet_analytics::core::value::{Metric, Unavailable, Value};
use balance_sheet_analytics::error::AnalyticsError;
use balance_sheet_analytics::io::export::write_csv;
use balance_sheet_analytics::io::loader::{load_table, read_table};
use balance_sheet_analytics::pipeline::dashboard::Dashboard;
use std::io::Write;

const ASSETS_CSV: &str = "End of Period,Cash on Hand,Investments in Treasury Bills,Total Loans and Advances,Total Assets,Bank Group\n\
    2019-11-30,40,300,1200,1540,Domestic\n\
    2019-12-31,45,310,1260,1615,Domestic\n\
    2020-01-31,50,320,1300,1670,Domestic\n\
    2020-02-29,48,330,1350,1728,Domestic\n\
    unknown,1,1,1,3,Domestic\n\
    2020-03-31,55,360,1420,1835,Domestic\n";

const LIABILITIES_CSV: &str = "End of Period,Demand Deposits,Time and Savings Deposits,Borrowings,Capital and Reserves,Total Liabilities\n\
    2019-12-31,200,900,300,215,1615\n\
    2020-01-31,210,930,310,220,1670\n\
    2020-02-29,205,960,0,563,1728\n\
    2020-04-30,220,990,320,240,1770\n";

fn schema() -> SchemaDescriptor {
    SchemaDescriptor::default()
}

fn dashboard() -> Dashboard {
    let assets = read_table(ASSETS_CSV.as_bytes(), "Assets", &schema()).unwrap();
    let liabilities = read_table(LIABILITIES_CSV.as_bytes(), "Liabilities", &schema()).unwrap();
    Dashboard::new(assets, liabilities, schema())
}

/// The two-row scenario: totals, mean of means, ratio and growth.
#[test]
fn two_month_scenario() {
    let table = RecordTable::builder(
        "T",
        vec!["Year".into(), "Month".into(), "A".into(), "B".into()],
    )
    .row(None, vec![Value::Number(2020.0), Value::from("Jan"), Value::Number(100.0), Value::Number(200.0)])
    .row(None, vec![Value::Number(2020.0), Value::from("Feb"), Value::Number(150.0), Value::Number(0.0)])
    .build()
    .unwrap();
    let ab = vec!["A".to_string(), "B".to_string()];

    assert_eq!(total(&table, &ab).unwrap(), Metric::Available(450.0));
    assert_eq!(average(&table, &ab).unwrap(), Metric::Available(112.5));

    let a: Vec<Option<f64>> = table.rows().iter().map(|r| r.values()[2].as_number()).collect();
    let b: Vec<Option<f64>> = table.rows().iter().map(|r| r.values()[3].as_number()).collect();
    let r = ratio(&a, &b).unwrap();
    assert_eq!(r[0], Metric::Available(0.5));
    assert_eq!(r[1], Metric::Unavailable(Unavailable::DivisionByZero));

    let g = growth_rate(&[Some(100.0), Some(150.0)], 1).unwrap();
    assert!(!g[0].is_available());
    assert_eq!(g[1], Metric::Available(50.0));
}

#[test]
fn classifier_scenario() {
    let columns: Vec<String> = ["Cash on Hand", "Total Loans and Advances", "Other Assets"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let map = classify(
        &columns,
        &[
            CategoryRule::new("Cash and Balances", ["Cash"]),
            CategoryRule::new("Investments", ["Investments"]),
        ],
    );
    assert_eq!(map.get("Cash and Balances").unwrap(), &["Cash on Hand".to_string()]);
    assert!(map.get("Investments").unwrap().is_empty());
}

/// Columns with unequal value counts separate the two averaging conventions.
#[test]
fn average_conventions_differ() {
    let table = RecordTable::builder("T", vec!["A".into(), "B".into()])
        .row(None, vec![Value::Number(10.0), Value::Number(1000.0)])
        .row(None, vec![Value::Number(20.0), Value::Missing])
        .row(None, vec![Value::Number(30.0), Value::Missing])
        .row(None, vec![Value::Number(40.0), Value::Missing])
        .build()
        .unwrap();
    let cols = vec!["A".to_string(), "B".to_string()];

    let per_column = average(&table, &cols).unwrap().value().unwrap();
    let flattened = average_with(&table, &cols, AverageMode::Flattened)
        .unwrap()
        .value()
        .unwrap();
    assert_relative_eq!(per_column, (25.0 + 1000.0) / 2.0);
    assert_relative_eq!(flattened, 1100.0 / 5.0);
    assert!((per_column - flattened).abs() > 1.0);
}

#[test]
fn full_pipeline_assets_2020() {
    let d = dashboard();
    // the row with an unparseable period was dropped at load
    assert_eq!(d.table(Dataset::Assets).len(), 5);

    let report = d
        .analyze(&FilterContext::new(Dataset::Assets).with_year(2020).with_threshold(0.9))
        .unwrap();

    assert_eq!(report.row_count, 3);
    assert_eq!(
        report.numeric_columns,
        vec![
            "Cash on Hand",
            "Investments in Treasury Bills",
            "Total Loans and Advances",
            "Total Assets"
        ]
    );
    assert_eq!(report.total, Metric::Available(10466.0));
    assert_eq!(report.biggest_contributor.as_deref(), Some("Total Assets"));

    let inv = report
        .category_totals
        .iter()
        .find(|c| c.name == "Investments")
        .unwrap();
    assert_eq!(inv.total, Metric::Available(1010.0));

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.column, "Cash on Hand");
    assert_eq!(summary.last_value, Metric::Available(55.0));
    assert_eq!(summary.delta, Metric::Available(7.0));

    // Jan and Feb 2020 are the only shared periods in 2020
    assert_eq!(report.asset_liability_ratio.len(), 2);
    for p in &report.asset_liability_ratio {
        assert_relative_eq!(p.value.value().unwrap(), 1.0);
    }

    let matrix = report.correlation.as_ref().unwrap();
    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            assert_eq!(matrix.cells[i][j], matrix.cells[j][i]);
        }
    }
    assert!(report
        .strong_pairs
        .iter()
        .all(|p| p.column_a != p.column_b && p.correlation.abs() > 0.9));

    assert!(report.notes.is_empty());
}

#[test]
fn prefix_total_mode() {
    let schema = SchemaDescriptor {
        total_mode: TotalMode::Prefix("Total ".into()),
        ..SchemaDescriptor::default()
    };
    let assets = read_table(ASSETS_CSV.as_bytes(), "Assets", &schema).unwrap();
    let liabilities = read_table(LIABILITIES_CSV.as_bytes(), "Liabilities", &schema).unwrap();
    let d = Dashboard::new(assets, liabilities, schema);

    let report = d.analyze(&FilterContext::new(Dataset::Liabilities)).unwrap();
    assert_eq!(report.total_columns, vec!["Total Liabilities"]);
    assert_eq!(report.total, Metric::Available(1615.0 + 1670.0 + 1728.0 + 1770.0));
}

#[test]
fn growth_over_quarterly_lag() {
    let ctx = FilterContext::new(Dataset::Assets)
        .with_lag(3)
        .with_columns(vec!["Total Assets".into()]);
    let report = dashboard().analyze(&ctx).unwrap();
    let points = &report.growth[0].points;
    assert_eq!(points.len(), 5);
    assert!(points[..3]
        .iter()
        .all(|p| p.value == Metric::Unavailable(Unavailable::NoPriorValue)));
    assert_relative_eq!(points[3].value.value().unwrap(), (1728.0 - 1540.0) / 1540.0 * 100.0);
}

#[test]
fn zero_borrowings_is_local() {
    let t = read_table(LIABILITIES_CSV.as_bytes(), "Liabilities", &schema()).unwrap();
    let cols: Vec<String> = vec!["Borrowings".into(), "Demand Deposits".into()];
    let m = correlation_matrix(&t, &cols).unwrap();
    assert!(m.cells[0][1].is_available());
    let pairs = strong_pairs(&m, 0.0);
    assert_eq!(pairs.len(), 1);
}

#[test]
fn non_numeric_column_rejected() {
    let t = read_table(ASSETS_CSV.as_bytes(), "Assets", &schema()).unwrap();
    let err = total(&t, &["Bank Group".to_string()]).unwrap_err();
    assert!(matches!(err, AnalyticsError::TypeMismatch { .. }));
}

#[test]
fn missing_source_is_data_unavailable() {
    let err = Dashboard::load("/no/such/assets.csv", "/no/such/liabilities.csv", schema())
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::DataUnavailable { .. }));
}

#[test]
fn load_from_file_and_export_filtered_view() {
    let dir = std::env::temp_dir().join(format!("bsa-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("assets.csv");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(ASSETS_CSV.as_bytes())
        .unwrap();

    let table = load_table(&path, "Assets", &schema()).unwrap();
    assert_eq!(table.len(), 5);

    let liabilities = read_table(LIABILITIES_CSV.as_bytes(), "Liabilities", &schema()).unwrap();
    let d = Dashboard::new(table, liabilities, schema());
    let ctx = FilterContext::new(Dataset::Assets).with_year(2020).with_month(2);
    let view = d.filtered(&ctx).unwrap();

    let mut buf = Vec::new();
    write_csv(&view, &mut buf).unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "End of Period,Cash on Hand,Investments in Treasury Bills,Total Loans and Advances,Total Assets,Bank Group\n\
         2020-02-29,48,330,1350,1728,Domestic\n"
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn report_serializes() {
    let report = dashboard().analyze(&FilterContext::default()).unwrap();
    let json = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed.get("total").is_some());
    assert!(parsed.get("category_totals").is_some());
    assert!(parsed.get("asset_liability_ratio").is_some());
    assert_eq!(parsed["dataset"], "assets");
}

#[test]
fn report_renders_as_text() {
    let report = dashboard()
        .analyze(&FilterContext::new(Dataset::Liabilities).with_year(2020))
        .unwrap();
    let text = report.to_string();
    assert!(text.contains("Liabilities Overview (2020)"));
    assert!(text.contains("Top Contributor:     Total Liabilities"));
}
