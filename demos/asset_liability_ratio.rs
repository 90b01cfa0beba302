//! Asset-to-liability ratio example.
//!
//! Two small tables, written with different date formats, that report on
//! different month ends. The ratio is only defined for the periods both
//! tables share, and a month with zero liabilities is shown as unavailable
//! instead of breaking the series.

use balance_sheet_analytics::analysis::growth::{aligned_ratio, period_totals};
use balance_sheet_analytics::io::loader::read_table;
use balance_sheet_analytics::prelude::*;

const ASSETS: &str = "\
End of Period,Cash on Hand,Total Loans and Advances
2022-01-31,120,880
2022-02-28,130,910
2022-03-31,150,950
2022-04-30,140,1010
";

const LIABILITIES: &str = "\
End of Period,Demand Deposits,Time and Savings Deposits
31/01/2022,300,500
28/02/2022,0,0
30/04/2022,350,560
31/05/2022,360,580
";

fn main() {
    println!("╔══════════════════════════════════════════════════╗");
    println!("║  balance-sheet-analytics: Asset / Liability Ratio ║");
    println!("╚══════════════════════════════════════════════════╝\n");

    let schema = SchemaDescriptor::default();
    let assets = read_table(ASSETS.as_bytes(), "Assets", &schema).unwrap();
    let liabilities = read_table(LIABILITIES.as_bytes(), "Liabilities", &schema).unwrap();

    // --- Scenario 1: per-period totals ---
    println!("━━━ Scenario 1: Period Totals ━━━\n");
    let a = period_totals(&assets, &assets.numeric_columns(), "Total Assets").unwrap();
    let l = period_totals(&liabilities, &liabilities.numeric_columns(), "Total Liabilities").unwrap();
    for series in [&a, &l] {
        println!("{}:", series.name);
        for p in &series.points {
            let value = p.value.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".into());
            println!("  {}  {:>8}", p.period.format("%b %Y"), value);
        }
    }

    // --- Scenario 2: aligned ratio ---
    println!("\n━━━ Scenario 2: Aligned Ratio ━━━\n");
    for p in aligned_ratio(&a, &l) {
        println!("  {}  {:>12.4}", p.period.format("%b %Y"), p.value);
    }
    println!("\n(Mar 2022 has no liabilities row and May 2022 has no assets row.)\n");

    // --- Scenario 3: the same through the dashboard ---
    println!("━━━ Scenario 3: Dashboard, Liabilities, lag 1 ━━━\n");
    let dashboard = Dashboard::new(assets, liabilities, schema);
    let report = dashboard
        .analyze(&FilterContext::new(Dataset::Liabilities).with_year(2022))
        .unwrap();
    println!("{}", report);
}
