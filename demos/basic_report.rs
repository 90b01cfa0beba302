//! Basic dashboard report example.
//!
//! Generates five years of synthetic monthly balance sheets and walks
//! through what the dashboard shows for one year of assets.

use balance_sheet_analytics::analysis::correlation::correlations_with;
use balance_sheet_analytics::analysis::summary::{available_months, available_years};
use balance_sheet_analytics::io::export::{export_file_name, ExportFormat};
use balance_sheet_analytics::prelude::*;
use balance_sheet_analytics::simulation::synthetic::{generate_balance_sheet, BalanceSheetConfig};

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  balance-sheet-analytics: Basic Report Example ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let assets = generate_balance_sheet(&BalanceSheetConfig::assets()).unwrap();
    let liabilities = generate_balance_sheet(&BalanceSheetConfig::liabilities()).unwrap();

    // --- Periods on offer ---
    println!("━━━ Available Periods ━━━\n");
    let years: Vec<String> = available_years(&assets).iter().map(|y| y.to_string()).collect();
    let months = available_months(&assets);
    println!("Years:  {}", years.join(", "));
    println!(
        "Months: {} .. {} ({} total)\n",
        months.first().map(String::as_str).unwrap_or("-"),
        months.last().map(String::as_str).unwrap_or("-"),
        months.len()
    );

    // --- Full report for 2021 ---
    let dashboard = Dashboard::new(assets, liabilities, SchemaDescriptor::default());
    let ctx = FilterContext::new(Dataset::Assets)
        .with_year(2021)
        .with_lag(3)
        .with_columns(vec![
            "Total Loans and Advances".into(),
            "Investments in Treasury Bills".into(),
        ]);
    let report = dashboard.analyze(&ctx).unwrap();
    println!("{}", report);

    // --- Diverging view: everything against loans ---
    println!("━━━ Correlation with Total Loans and Advances ━━━\n");
    if let Some(matrix) = &report.correlation {
        for (column, r) in correlations_with(matrix, "Total Loans and Advances").unwrap() {
            let bar = "█".repeat((r.abs() * 20.0).round() as usize);
            let side = if r < 0.0 { "-" } else { "+" };
            println!("  {:<32} {:>7.3} {}{}", column, r, side, bar);
        }
    }

    // --- Category breakdown ---
    println!("\n━━━ Category Membership ━━━\n");
    for category in report.categories.non_empty() {
        println!("  {}: {}", category.name, category.columns.join(", "));
    }

    let name = export_file_name("Assets", ctx.year, ExportFormat::Csv);
    println!("\nThe filtered view would download as {}", name);
}
