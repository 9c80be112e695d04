//! # CBT Archive Summary Library
//!
//! Reduces raw per-client benchmark output (JSON records archived by CBT or
//! compatible harnesses) to one statistically-correct summary per logical
//! test: throughput, average/min/max latency, and requested latency
//! percentiles, separately for read and write operations where the
//! benchmark distinguishes them.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `discover`: archive traversal and grouping of output files by test
//! - `extract`: per-record normalization into one common metrics shape,
//!   polymorphic over the supported benchmark families
//! - `aggregate`: IOPS-weighted reduction of a test's client records into
//!   its summary
//! - `stats` / `units`: the percentile and weighted-average primitives and
//!   unit normalization they rely on
//! - `report`: table/CSV rendering and the consolidated JSON report
//! - `cli`: command-line parsing and the run-wide `ReportConfig`
//!
//! Data flows one way: raw files -> [`extract::extract`] (one call per
//! file) -> [`aggregate::aggregate`] (one call per test) ->
//! [`aggregate::TestSummary`] -> rendering. Extraction and aggregation are
//! pure and per-test independent; the run driver processes tests in
//! parallel and isolates failures per test.

pub mod aggregate;
pub mod cli;
pub mod discover;
pub mod error;
pub mod extract;
pub mod logging;
pub mod report;
pub mod stats;
pub mod units;

pub use aggregate::{aggregate, sort_summaries, TestMetadata, TestSummary};
pub use cli::{Args, PercentileKey, ReportConfig};
pub use discover::{discover_tests, DiscoveredTest};
pub use error::SummaryError;
pub use extract::{extract, BenchmarkVariant, LatencyStats, OutputMetrics};
pub use report::{write_json_report, ReportWriter};

/// The current version of the summary tool, included in the JSON report for
/// reproducibility.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values.
pub mod defaults {
    /// Percentile set applied when `--pctiles` is given without a value,
    /// matching the reference tool.
    pub const PERCENTILES: &str = "50.00,80.00,90.00,95.00,99.00";

    /// File that marks a test output directory inside an archive.
    pub const TEST_MARKER: &str = "benchmark_config.yaml";

    /// Substring identifying client output files next to the marker.
    pub const OUTPUT_FILE_TOKEN: &str = "json_";
}
