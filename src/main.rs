use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use txn_report::{process_upload, CsvParser, MatchingArgs, ReportStore};

/// Aggregate a local transactions CSV and print the report as JSON
#[derive(Parser, Debug)]
#[command(name = "txn-report", version)]
struct Cli {
    /// CSV file with `Date, Type, Amount($), Memo` rows
    file: PathBuf,

    #[command(flatten)]
    matching: MatchingArgs,

    /// Print accepted / rejected row counts alongside the report
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let contents = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;

    let parser = CsvParser::new(cli.matching.matcher());
    let store = ReportStore::new();
    let summary = process_upload(&contents, &parser, &store);

    let json = if cli.summary {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string_pretty(&*store.snapshot())?
    };
    println!("{}", json);

    Ok(())
}
