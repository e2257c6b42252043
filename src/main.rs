//! CustInsight: customer segmentation and insights CLI
//!
//! This is the main entrypoint that orchestrates data loading, analysis,
//! the console report and the JSON snapshot output.

use anyhow::{Context, Result};
use clap::Parser;
use custinsight::{analyze, data, report, sample, Analysis, Args, Table};
use std::fs;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.to_config()?;
    let start_time = Instant::now();

    // Step 1: Load or generate the table
    let table = load_input(&args, &config.reference_date)?;
    println!(
        "✓ Data loaded: {} records, {} columns",
        table.len(),
        table.columns().len()
    );

    // Step 2: Analyze
    let analysis_start = Instant::now();
    let analysis = analyze(&table, &config);
    log::info!(
        "Analysis finished in {:.2}s",
        analysis_start.elapsed().as_secs_f64()
    );

    match &analysis {
        Analysis::NoData => println!("\nNo data to analyze."),
        Analysis::Insights(snapshot) => {
            println!();
            report::print_summary(snapshot).context("printing summary")?;
        }
    }

    // Step 3: Write the snapshot
    let json = serde_json::to_string_pretty(&analysis).context("serializing snapshot")?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing snapshot to {path}"))?;
            println!("\nSnapshot saved to: {}", path);
        }
        None => println!("\n{}", json),
    }

    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Initialise env_logger; `--verbose` lowers the default level to debug
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_input(args: &Args, reference_date: &chrono::NaiveDate) -> Result<Table> {
    match args.sample {
        Some(n) => {
            log::info!("Generating {} sample customers", n);
            let table = sample::generate(n, args.seed, *reference_date);
            if let Some(path) = &args.write_sample {
                data::write_table(&table, path)?;
                println!("Sample data saved to: {}", path);
            }
            Ok(table)
        }
        None => {
            log::info!("Loading input file {}", args.input);
            data::load_table(&args.input)
        }
    }
}
