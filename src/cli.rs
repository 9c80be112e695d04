use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// CBT Archive Summary - reduce benchmark archives to per-test statistics
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Comma-separated latency percentiles to report (##.##)
    #[clap(
        short = 'p',
        long = "pctiles",
        value_name = "PCTILES",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = crate::defaults::PERCENTILES
    )]
    pub pctiles: Option<String>,

    /// Separate IOPS and latency between reads and writes
    #[clap(short = 's', long, default_value_t = false)]
    pub split: bool,

    /// Print output in CSV format
    #[clap(short = 'c', long, default_value_t = false)]
    pub csv: bool,

    /// Write a consolidated JSON report to this file
    #[clap(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// CBT output directory(s) to parse
    #[clap(value_name = "DIR", num_args = 1.., required = true)]
    pub dirs: Vec<PathBuf>,
}

/// A latency percentile identifier with two fixed fraction digits
/// (e.g. `99.00`), chosen at configuration time.
///
/// Stored in hundredths of a percent so keys are exactly comparable and
/// hashable; fio's bucket labels (`99.000000`) and user input (`99`, `99.0`)
/// normalize to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PercentileKey(u32);

impl PercentileKey {
    /// The percentile as a probability in [0, 1], the form taken by
    /// [`crate::stats::percentile`].
    pub fn fraction(&self) -> f64 {
        f64::from(self.0) / 10_000.0
    }

    /// Parse a bucket label from a source record. Returns `None` for labels
    /// that are not plain decimal percentiles.
    pub fn from_label(label: &str) -> Option<Self> {
        label.trim().parse().ok()
    }
}

impl FromStr for PercentileKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .parse()
            .map_err(|_| format!("invalid percentile: {}", s))?;
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("percentile out of range: {}", s));
        }
        Ok(PercentileKey((value * 100.0).round() as u32))
    }
}

impl fmt::Display for PercentileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", f64::from(self.0) / 100.0)
    }
}

// Percentile maps serialize with the display form as the key, matching the
// column labels in tabular output.
impl Serialize for PercentileKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Run-wide reporting configuration, applied uniformly across all tests.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Requested percentile keys; empty unless `--pctiles` was given.
    pub percentiles: Vec<PercentileKey>,
    pub split: bool,
    pub csv: bool,
    pub output_file: Option<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl ReportConfig {
    /// Build the internal configuration from parsed CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let percentiles = match &args.pctiles {
            Some(spec) => parse_percentile_list(spec)
                .with_context(|| format!("invalid --pctiles value: {}", spec))?,
            None => Vec::new(),
        };

        Ok(Self {
            percentiles,
            split: args.split,
            csv: args.csv,
            output_file: args.output_file.clone(),
            dirs: args.dirs.clone(),
        })
    }
}

fn parse_percentile_list(spec: &str) -> Result<Vec<PercentileKey>> {
    spec.split(',')
        .map(|part| part.trim().parse().map_err(anyhow::Error::msg))
        .collect()
}
