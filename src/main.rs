//! # CBT Archive Summary - Main Entry Point
//!
//! One-shot batch driver: parse the CLI, discover the logical tests under
//! each archive directory, extract and aggregate them in parallel, then
//! render the sorted summaries and optionally write the JSON report.
//!
//! A failure (malformed record, unknown variant, test with no outputs) is
//! fatal only to the test it concerns; sibling tests keep processing and
//! the diagnostic is logged.

use anyhow::Result;
use cbt_summary::{
    aggregate::{aggregate, sort_summaries, TestSummary},
    cli::{Args, ReportConfig},
    discover::{discover_tests, DiscoveredTest},
    extract::extract,
    logging::ColorizedFormatter,
    report::{write_json_report, ReportWriter},
};
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Log level is controlled via RUST_LOG, e.g. RUST_LOG=debug.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .event_format(ColorizedFormatter)
        .init();

    let args = Args::parse();
    let config = ReportConfig::from_args(&args)?;
    debug!("configuration: {:?}", config);

    let writer = ReportWriter::new(&config);
    let stdout = std::io::stdout();
    let mut all_summaries = Vec::new();

    for dir in &config.dirs {
        info!("parsing archive {}", dir.display());
        let discovered = discover_tests(dir)?;

        // Tests are independent once discovered: immutable inputs, no
        // shared state, so they summarize in parallel.
        let mut summaries: Vec<TestSummary> = discovered
            .par_iter()
            .filter_map(|test| match summarize_test(test, &config) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    error!("skipping test {}: {:#}", test.metadata.test_id(), e);
                    None
                }
            })
            .collect();

        sort_summaries(&mut summaries);
        writer.render(&mut stdout.lock(), &summaries)?;
        all_summaries.extend(summaries);
    }

    if let Some(ref path) = config.output_file {
        write_json_report(path, &all_summaries)?;
    }

    Ok(())
}

/// Extract every output file of one test and reduce them to its summary.
/// Empty files were already excluded with a diagnostic during extraction.
fn summarize_test(test: &DiscoveredTest, config: &ReportConfig) -> Result<TestSummary> {
    let mut outputs = Vec::with_capacity(test.files.len());
    for file in &test.files {
        if let Some(metrics) = extract(file, test.variant, config)? {
            outputs.push(metrics);
        }
    }
    Ok(aggregate(&outputs, test.metadata.clone())?)
}
