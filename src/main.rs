//! balance-sheet-analytics CLI
//!
//! Run the dashboard pipeline from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Overview of the assets table for 2020
//! balance-sheet-analytics report --assets assets.csv --liabilities liabilities.csv --year 2020
//!
//! # Liabilities report as JSON, quarterly growth
//! balance-sheet-analytics report --assets assets.csv --liabilities liabilities.csv \
//!     --dataset liabilities --lag 3 --format json
//!
//! # Export the filtered view
//! balance-sheet-analytics export --assets assets.csv --liabilities liabilities.csv \
//!     --year 2020 --output Assets_2020.csv
//!
//! # Generate a synthetic dataset
//! balance-sheet-analytics generate --kind liabilities --months 36 --output liabilities.csv
//! ```

use balance_sheet_analytics::analysis::summary::{available_months, available_years};
use balance_sheet_analytics::core::filter::{Dataset, FilterContext};
use balance_sheet_analytics::core::schema::SchemaDescriptor;
use balance_sheet_analytics::io::export::{export, write_csv, ExportFormat};
use balance_sheet_analytics::io::loader::load_table;
use balance_sheet_analytics::pipeline::dashboard::Dashboard;
use balance_sheet_analytics::simulation::synthetic::{generate_balance_sheet, BalanceSheetConfig};
use std::process;
use std::str::FromStr;

fn print_usage() {
    eprintln!(
        r#"balance-sheet-analytics - banking balance sheet aggregation and metrics

USAGE:
    balance-sheet-analytics <COMMAND> [OPTIONS]

COMMANDS:
    report      Compute the dashboard report for a filter selection
    periods     List the years and months available in a table
    export      Write the filtered view to CSV or JSON
    generate    Generate a synthetic monthly balance sheet (CSV)
    help        Show this message

OPTIONS (report, export):
    --assets <FILE>        Assets CSV
    --liabilities <FILE>   Liabilities CSV
    --dataset <NAME>       assets (default) or liabilities
    --year <YYYY>          Filter by year
    --month <1-12>         Filter by month
    --schema <FILE>        JSON schema descriptor (period column, categories)

OPTIONS (report):
    --lag <N>              Growth-rate lag in periods (default: 1)
    --threshold <R>        Strong-correlation threshold (default: 0.7)
    --top <N>              Number of top/bottom records (default: 5)
    --columns <LIST>       Comma-separated columns for growth and summary
    --format <FORMAT>      text (default) or json

OPTIONS (export):
    --output <FILE>        Destination file
    --format <FORMAT>      csv (default), json or xlsx

OPTIONS (periods):
    --input <FILE>         CSV to inspect
    --schema <FILE>        JSON schema descriptor

OPTIONS (generate):
    --kind <NAME>          assets (default) or liabilities
    --months <N>           Number of monthly periods (default: 60)
    --start <YYYY-MM>      First period (default: 2020-01)
    --output <FILE>        Write to file instead of stdout

EXAMPLES:
    balance-sheet-analytics report --assets assets.csv --liabilities liabilities.csv --year 2020
    balance-sheet-analytics report --assets assets.csv --liabilities liabilities.csv --dataset liabilities --format json
    balance-sheet-analytics periods --input assets.csv
    balance-sheet-analytics export --assets assets.csv --liabilities liabilities.csv --year 2020 --output Assets_2020.csv
    balance-sheet-analytics generate --kind liabilities --months 36 --output liabilities.csv"#
    );
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

/// Parsed `--flag value` pairs.
struct Options {
    pairs: Vec<(String, String)>,
}

impl Options {
    fn parse(args: &[String], allowed: &[&str]) -> Self {
        let mut pairs = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            if !allowed.contains(&flag) {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
            i += 1;
            let value = args.get(i).cloned().unwrap_or_else(|| {
                eprintln!("{} requires a value", flag);
                process::exit(1);
            });
            pairs.push((flag.to_string(), value));
            i += 1;
        }
        Self { pairs }
    }

    fn get(&self, flag: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(f, _)| f == flag)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, flag: &str) -> &str {
        self.get(flag)
            .unwrap_or_else(|| fail(format!("{} <FILE> is required", flag)))
    }

    fn parsed<T: FromStr>(&self, flag: &str) -> Option<T>
    where
        T::Err: std::fmt::Display,
    {
        self.get(flag).map(|v| {
            v.parse()
                .unwrap_or_else(|e| fail(format!("invalid value '{}' for {}: {}", v, flag, e)))
        })
    }
}

const FILTER_FLAGS: &[&str] = &["--assets", "--liabilities", "--dataset", "--year", "--month", "--schema"];

fn load_schema(opts: &Options) -> SchemaDescriptor {
    match opts.get("--schema") {
        Some(path) => SchemaDescriptor::from_file(path).unwrap_or_else(|e| fail(e)),
        None => SchemaDescriptor::default(),
    }
}

fn load_dashboard(opts: &Options) -> Dashboard {
    let schema = load_schema(opts);
    Dashboard::load(opts.require("--assets"), opts.require("--liabilities"), schema)
        .unwrap_or_else(|e| fail(format!("{}\nNo report was produced; check the file paths and try again.", e)))
}

fn filter_context(opts: &Options) -> FilterContext {
    let mut ctx = FilterContext::new(opts.parsed::<Dataset>("--dataset").unwrap_or_default());
    ctx.year = opts.parsed("--year");
    ctx.month = opts.parsed("--month");
    ctx
}

fn cmd_report(args: &[String]) {
    let mut allowed = FILTER_FLAGS.to_vec();
    allowed.extend(["--lag", "--threshold", "--top", "--columns", "--format"]);
    let opts = Options::parse(args, &allowed);

    let dashboard = load_dashboard(&opts);
    let mut ctx = filter_context(&opts);
    if let Some(lag) = opts.parsed("--lag") {
        ctx.lag = lag;
    }
    if let Some(threshold) = opts.parsed("--threshold") {
        ctx.threshold = threshold;
    }
    if let Some(n) = opts.parsed("--top") {
        ctx.top_n = n;
    }
    if let Some(cols) = opts.get("--columns") {
        ctx.columns = Some(cols.split(',').map(|c| c.trim().to_string()).collect());
    }

    let report = dashboard.analyze(&ctx).unwrap_or_else(|e| fail(e));

    match opts.get("--format").unwrap_or("text") {
        "json" => {
            let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| fail(e));
            println!("{}", json);
        }
        "text" => print!("{}", report),
        other => fail(format!("--format must be 'text' or 'json', got '{}'", other)),
    }
}

fn cmd_periods(args: &[String]) {
    let opts = Options::parse(args, &["--input", "--schema"]);
    let schema = load_schema(&opts);
    let path = opts.require("--input");
    let table = load_table(path, path, &schema).unwrap_or_else(|e| fail(e));

    if !table.has_period() {
        println!("No '{}' column: period filters are not available.", schema.period_column);
        return;
    }
    let years: Vec<String> = available_years(&table).iter().map(|y| y.to_string()).collect();
    println!("Years:  {}", years.join(", "));
    println!("Months: {}", available_months(&table).join(", "));
}

fn cmd_export(args: &[String]) {
    let mut allowed = FILTER_FLAGS.to_vec();
    allowed.extend(["--output", "--format"]);
    let opts = Options::parse(args, &allowed);

    let dashboard = load_dashboard(&opts);
    let ctx = filter_context(&opts);
    let format: ExportFormat = opts.parsed("--format").unwrap_or(ExportFormat::Csv);
    let output = opts.require("--output");

    let view = dashboard.filtered(&ctx).unwrap_or_else(|e| fail(e));
    export(&view, output, format).unwrap_or_else(|e| fail(e));
    eprintln!("Exported {} {} rows → {}", view.len(), ctx.dataset, output);
}

fn cmd_generate(args: &[String]) {
    let opts = Options::parse(args, &["--kind", "--months", "--start", "--output"]);

    let mut config = match opts.parsed::<Dataset>("--kind").unwrap_or_default() {
        Dataset::Assets => BalanceSheetConfig::assets(),
        Dataset::Liabilities => BalanceSheetConfig::liabilities(),
    };
    if let Some(months) = opts.parsed("--months") {
        config.months = months;
    }
    if let Some(start) = opts.get("--start") {
        config.start = balance_sheet_analytics::core::period::parse_period(start)
            .unwrap_or_else(|| fail(format!("--start must look like YYYY-MM, got '{}'", start)));
    }

    let table = generate_balance_sheet(&config).unwrap_or_else(|e| fail(e));

    if let Some(path) = opts.get("--output") {
        export(&table, path, ExportFormat::Csv).unwrap_or_else(|e| fail(e));
        eprintln!(
            "Generated {} months of {} ({} columns) → {}",
            table.len(),
            config.name,
            config.columns.len(),
            path
        );
    } else {
        write_csv(&table, std::io::stdout().lock()).unwrap_or_else(|e| fail(e));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "report" => cmd_report(rest),
        "periods" => cmd_periods(rest),
        "export" => cmd_export(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
