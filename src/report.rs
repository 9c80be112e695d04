//! Rendering and persistence of test summaries.
//!
//! Consumes [`TestSummary`] values only: an aligned table or CSV on stdout,
//! plus an optional consolidated JSON report carrying run identity for
//! reproducibility. No statistics are computed here.

use crate::aggregate::TestSummary;
use crate::cli::ReportConfig;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Tabular renderer for one run's sorted summaries.
pub struct ReportWriter<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportWriter<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Write the header and one row per summary, as CSV or an aligned table
    /// depending on the configuration.
    pub fn render<W: Write>(&self, out: &mut W, summaries: &[TestSummary]) -> Result<()> {
        let header = self.header_cells();
        let rows: Vec<Vec<String>> = summaries.iter().map(|s| self.row_cells(s)).collect();

        if self.config.csv {
            writeln!(out, "{}", header.join(", "))?;
            for row in &rows {
                writeln!(out, "{}", row.join(", "))?;
            }
            return Ok(());
        }

        let widths = column_widths(&header, &rows);
        writeln!(out, "{}", pad_row(&header, &widths).join(" | "))?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(out, "{}", rule.join("-+-"))?;
        for row in &rows {
            writeln!(out, "{}", pad_row(row, &widths).join(" | "))?;
        }
        Ok(())
    }

    fn header_cells(&self) -> Vec<String> {
        let mut cells: Vec<String> = [
            "Benchmark",
            "Iteration",
            "Procs",
            "IOSize",
            "Pattern",
            "Mix",
            "IODepth",
            "Bandwidth(KB/s)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if self.config.split {
            cells.extend([
                "readIOPS".to_string(),
                "writeIOPS".to_string(),
                "readAvgLat(ms)".to_string(),
                "writeAvgLat(ms)".to_string(),
                "readMinLat(ms)".to_string(),
                "writeMinLat(ms)".to_string(),
            ]);
            for key in &self.config.percentiles {
                cells.push(format!("read{}pctLat(ms)", key));
                cells.push(format!("write{}pctLat(ms)", key));
            }
            cells.push("readMaxLat(ms)".to_string());
            cells.push("writeMaxLat(ms)".to_string());
        } else {
            cells.extend([
                "IOPS".to_string(),
                "avgLat(ms)".to_string(),
                "minLat(ms)".to_string(),
            ]);
            for key in &self.config.percentiles {
                cells.push(format!("{}pctLat(ms)", key));
            }
            cells.push("maxLat(ms)".to_string());
        }
        cells
    }

    fn row_cells(&self, summary: &TestSummary) -> Vec<String> {
        let meta = &summary.metadata;
        let mut cells = vec![
            meta.benchmark.clone(),
            meta.iteration.to_string(),
            summary.clients.to_string(),
            meta.op_size.to_string(),
            meta.mode.clone(),
            meta.rwmixread.to_string(),
            meta.io_depth.to_string(),
            format!("{:.0}", summary.bandwidth_kbps),
        ];

        if self.config.split {
            cells.push(format!("{:.0}", summary.read_iops));
            cells.push(format!("{:.0}", summary.write_iops));
            cells.push(format!("{:.2}", summary.read_latency.avg));
            cells.push(format!("{:.2}", summary.write_latency.avg));
            cells.push(format!("{:.2}", summary.read_latency.min));
            cells.push(format!("{:.2}", summary.write_latency.min));
            for key in &self.config.percentiles {
                let read = summary.read_latency.percentiles.get(key).copied();
                let write = summary.write_latency.percentiles.get(key).copied();
                cells.push(format!("{:.2}", read.unwrap_or_default()));
                cells.push(format!("{:.2}", write.unwrap_or_default()));
            }
            cells.push(format!("{:.2}", summary.read_latency.max));
            cells.push(format!("{:.2}", summary.write_latency.max));
        } else {
            cells.push(format!("{:.0}", summary.iops));
            cells.push(format!("{:.2}", summary.latency.avg));
            cells.push(format!("{:.2}", summary.latency.min));
            for key in &self.config.percentiles {
                let value = summary.latency.percentiles.get(key).copied();
                cells.push(format!("{:.2}", value.unwrap_or_default()));
            }
            cells.push(format!("{:.2}", summary.latency.max));
        }
        cells
    }
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    widths
}

fn pad_row(cells: &[String], widths: &[usize]) -> Vec<String> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<1$}", cell, width))
        .collect()
}

/// Consolidated JSON report for a whole run.
#[derive(Debug, Serialize)]
pub struct FinalReport<'a> {
    pub run_id: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub version: &'static str,
    pub total_tests: usize,
    pub results: &'a [TestSummary],
}

/// Write all of a run's summaries to `path` as pretty-printed JSON.
pub fn write_json_report(path: &Path, summaries: &[TestSummary]) -> Result<()> {
    let report = FinalReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now(),
        version: crate::VERSION,
        total_tests: summaries.len(),
        results: summaries,
    };

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)?;
    info!("report written to {}", path.display());
    Ok(())
}
