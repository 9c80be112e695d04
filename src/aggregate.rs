//! Reduction of per-client measurements into one test-level summary.
//!
//! Aggregation is pure and order-independent: iops and bandwidth totals are
//! sums, every latency moment and percentile key is an IOPS-weighted average
//! across clients, and the combined family resolves through the zero-weight
//! fallback when one direction recorded no operations. Each test depends
//! only on its own outputs, so tests of a run may be aggregated in parallel
//! with no coordination.

use crate::error::SummaryError;
use crate::extract::{LatencyStats, OutputMetrics};
use crate::stats::weighted_average;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity and configuration of one logical test, recovered from the
/// benchmark configuration marker and the archive path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestMetadata {
    pub benchmark: String,
    pub iteration: i64,
    pub op_size: i64,
    pub io_depth: i64,
    pub mode: String,
    pub rwmixread: i64,
    pub hash_id: String,
}

impl TestMetadata {
    /// Short identity used in diagnostics.
    pub fn test_id(&self) -> String {
        format!(
            "{}/{}/iter-{}",
            self.hash_id, self.benchmark, self.iteration
        )
    }
}

/// One logical test's aggregated statistics, derived entirely from its owned
/// list of [`OutputMetrics`] and recomputed in full on every aggregation
/// call. Read-only once produced; rendering and persistence consume it as a
/// plain value.
#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    pub metadata: TestMetadata,
    /// Number of client output files that contributed.
    pub clients: usize,
    pub iops: f64,
    pub read_iops: f64,
    pub write_iops: f64,
    pub bandwidth_kbps: f64,
    pub latency: LatencyStats,
    pub read_latency: LatencyStats,
    pub write_latency: LatencyStats,
}

/// Combine one test's client records into its summary.
///
/// Fails with [`SummaryError::NoOutputs`] when `outputs` is empty: every
/// statistic would be undefined and must not be mistaken for a real
/// zero-throughput result.
pub fn aggregate(
    outputs: &[OutputMetrics],
    metadata: TestMetadata,
) -> Result<TestSummary, SummaryError> {
    if outputs.is_empty() {
        return Err(SummaryError::NoOutputs(metadata.test_id()));
    }

    let read_iops: f64 = outputs.iter().map(|o| o.read_iops).sum();
    let write_iops: f64 = outputs.iter().map(|o| o.write_iops).sum();
    let iops: f64 = outputs.iter().map(|o| o.iops).sum();
    let bandwidth_kbps: f64 = outputs.iter().map(|o| o.bandwidth_kbps).sum();

    let read_latency = weighted_family(outputs, |o| &o.read_latency, |o| o.read_iops);
    let write_latency = weighted_family(outputs, |o| &o.write_latency, |o| o.write_iops);
    let latency = if read_iops == 0.0 && write_iops == 0.0 {
        // No per-direction data at all (single-stream family): weight the
        // clients' combined families directly by their iops.
        weighted_family(outputs, |o| &o.latency, |o| o.iops)
    } else {
        LatencyStats::blend(&read_latency, &write_latency, read_iops, write_iops)
    };

    Ok(TestSummary {
        metadata,
        clients: outputs.len(),
        iops,
        read_iops,
        write_iops,
        bandwidth_kbps,
        latency,
        read_latency,
        write_latency,
    })
}

/// IOPS-weighted average of one latency family across clients. A direction
/// with zero total weight stays at the all-zero default and is resolved by
/// the combined-family fallback instead.
fn weighted_family<'a, F, W>(outputs: &'a [OutputMetrics], family: F, weight: W) -> LatencyStats
where
    F: Fn(&'a OutputMetrics) -> &'a LatencyStats,
    W: Fn(&'a OutputMetrics) -> f64,
{
    let weights: Vec<f64> = outputs.iter().map(&weight).collect();
    if weights.iter().sum::<f64>() == 0.0 {
        return LatencyStats::default();
    }

    let moment = |select: fn(&LatencyStats) -> f64| {
        let values: Vec<f64> = outputs.iter().map(|o| select(family(o))).collect();
        weighted_average(&values, &weights).unwrap_or_default()
    };

    let mut percentiles = BTreeMap::new();
    let keys: Vec<_> = outputs
        .iter()
        .flat_map(|o| family(o).percentiles.keys().copied())
        .collect();
    for key in keys {
        if percentiles.contains_key(&key) {
            continue;
        }
        let mut values = Vec::new();
        let mut key_weights = Vec::new();
        for (output, w) in outputs.iter().zip(&weights) {
            if let Some(value) = family(output).percentiles.get(&key) {
                values.push(*value);
                key_weights.push(*w);
            }
        }
        if let Some(value) = weighted_average(&values, &key_weights) {
            percentiles.insert(key, value);
        }
    }

    LatencyStats {
        avg: moment(|l| l.avg),
        min: moment(|l| l.min),
        max: moment(|l| l.max),
        percentiles,
    }
}

/// Canonical presentation order for a run's summaries. Aggregation itself is
/// order-independent; this applies only when rendering.
pub fn sort_summaries(summaries: &mut [TestSummary]) {
    summaries.sort_by(|a, b| {
        let ka = (
            &a.metadata.benchmark,
            a.metadata.rwmixread,
            a.clients,
            a.metadata.op_size,
            a.metadata.iteration,
            a.metadata.io_depth,
        );
        let kb = (
            &b.metadata.benchmark,
            b.metadata.rwmixread,
            b.clients,
            b.metadata.op_size,
            b.metadata.iteration,
            b.metadata.io_depth,
        );
        ka.cmp(&kb)
    });
}
