//! Normalization of raw benchmark output records.
//!
//! One call to [`extract`] turns one raw output file (one client's run) into
//! one [`OutputMetrics`] value: iops and bandwidth totals, latency moments in
//! milliseconds, and the requested percentile figures, split by operation
//! direction when the benchmark supports it. Jobs running in parallel within
//! a single file are pre-aggregated here, so the aggregator only ever sees
//! one record per client.

use crate::cli::{PercentileKey, ReportConfig};
use crate::error::SummaryError;
use crate::stats::{percentile, weighted_average};
use crate::units::to_millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Supported benchmark tool families. Adding a tool means adding a variant
/// here and an extraction arm in [`extract`]; nothing in the aggregator
/// branches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchmarkVariant {
    /// fio and its CBT wrappers (librbdfio, kvmrbdfio, ...): per-job
    /// read/write metrics with optional completion-latency percentiles.
    Fio,
    /// Single-stream benchmarks reporting one set of combined scalars with
    /// no read/write distinction and no percentile buckets.
    SingleStream,
}

impl BenchmarkVariant {
    /// Resolve the variant from the benchmark name recorded in the test
    /// configuration. An unknown name is fatal for that test.
    pub fn from_benchmark_name(name: &str) -> Result<Self, SummaryError> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("fio") {
            Ok(BenchmarkVariant::Fio)
        } else if lower.contains("singlestream") || lower.contains("single-stream") {
            Ok(BenchmarkVariant::SingleStream)
        } else {
            Err(SummaryError::UnknownVariant(name.to_string()))
        }
    }
}

impl std::fmt::Display for BenchmarkVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkVariant::Fio => write!(f, "fio"),
            BenchmarkVariant::SingleStream => write!(f, "single-stream"),
        }
    }
}

/// Latency moments plus requested percentile figures, all in milliseconds.
///
/// `min <= avg <= max` holds whenever the stats were computed from real
/// weighted samples; the zero-weight fallback paths leave a family at this
/// all-zero default instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: BTreeMap<PercentileKey, f64>,
}

impl LatencyStats {
    /// Combined-direction figures: the blend of the read and write families
    /// weighted by their iops totals. A direction with zero iops contributes
    /// nothing and the combined family is taken directly from the other
    /// side, never from an undefined read/write mix.
    pub fn blend(read: &LatencyStats, write: &LatencyStats, read_iops: f64, write_iops: f64) -> Self {
        if read_iops == 0.0 {
            return write.clone();
        }
        if write_iops == 0.0 {
            return read.clone();
        }

        let weights = [read_iops, write_iops];
        let pair = |r: f64, w: f64| weighted_average(&[r, w], &weights).unwrap_or_default();

        let mut percentiles = BTreeMap::new();
        for (key, read_value) in &read.percentiles {
            if let Some(write_value) = write.percentiles.get(key) {
                percentiles.insert(*key, pair(*read_value, *write_value));
            }
        }

        LatencyStats {
            avg: pair(read.avg, write.avg),
            min: pair(read.min, write.min),
            max: pair(read.max, write.max),
            percentiles,
        }
    }
}

/// One client's normalized measurement, immutable after extraction and owned
/// by exactly one test. Every numeric field is present (zero when the source
/// omitted it); percentile maps carry only requested keys the source
/// actually supplied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputMetrics {
    pub iops: f64,
    pub read_iops: f64,
    pub write_iops: f64,
    pub bandwidth_kbps: f64,
    pub read_bw_kbps: f64,
    pub write_bw_kbps: f64,
    pub latency: LatencyStats,
    pub read_latency: LatencyStats,
    pub write_latency: LatencyStats,
}

/// Parse one raw output file into one [`OutputMetrics`] value.
///
/// Returns `Ok(None)` for a zero-byte file: the file is excluded from the
/// test with a diagnostic, which is a recoverable skip rather than a
/// failure. Structural problems fail with
/// [`SummaryError::MalformedRecord`].
pub fn extract(
    path: &Path,
    variant: BenchmarkVariant,
    config: &ReportConfig,
) -> Result<Option<OutputMetrics>, SummaryError> {
    let raw = fs::read(path).map_err(|e| SummaryError::MalformedRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if raw.is_empty() {
        warn!("{} is empty, skipping", path.display());
        return Ok(None);
    }

    debug!("extracting {} record from {}", variant, path.display());
    let metrics = match variant {
        BenchmarkVariant::Fio => extract_fio(path, &raw, config)?,
        BenchmarkVariant::SingleStream => extract_single_stream(path, &raw)?,
    };
    Ok(Some(metrics))
}

/// fio renamed its latency blocks between major versions: fio 2.x reports
/// `lat`/`clat` in microseconds, fio 3.x reports `lat_ns`/`clat_ns` in
/// nanoseconds. The scheme is resolved once per file from the version
/// marker, not per field.
struct FieldScheme {
    lat_key: &'static str,
    clat_key: &'static str,
    time_unit: &'static str,
}

impl FieldScheme {
    fn detect(record: &Value) -> Self {
        let version = record
            .get("fio version")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if version.contains("fio-2.") {
            FieldScheme {
                lat_key: "lat",
                clat_key: "clat",
                time_unit: "usec",
            }
        } else {
            FieldScheme {
                lat_key: "lat_ns",
                clat_key: "clat_ns",
                time_unit: "nsec",
            }
        }
    }
}

/// Per-direction accumulator over the jobs of one file. Latency moments are
/// weighted by each job's iops in that direction.
#[derive(Default)]
struct DirectionSamples {
    iops: Vec<f64>,
    bw_kbps: f64,
    avg: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
    /// Per key, the (value, job iops) pairs that supplied it; a job that
    /// omits a bucket simply contributes no pair for that key.
    pct: BTreeMap<PercentileKey, Vec<(f64, f64)>>,
}

impl DirectionSamples {
    fn total_iops(&self) -> f64 {
        self.iops.iter().sum()
    }

    /// Collapse the job samples into one weighted latency family. All-zero
    /// weights (a test with no operations in this direction) leave the
    /// family at its default.
    fn weighted_stats(&self) -> LatencyStats {
        let weights = &self.iops;
        let avg = match weighted_average(&self.avg, weights) {
            Some(value) => value,
            None => return LatencyStats::default(),
        };

        let mut percentiles = BTreeMap::new();
        for (key, pairs) in &self.pct {
            let values: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
            let pct_weights: Vec<f64> = pairs.iter().map(|(_, w)| *w).collect();
            if let Some(value) = weighted_average(&values, &pct_weights) {
                percentiles.insert(*key, value);
            }
        }

        LatencyStats {
            avg,
            min: weighted_average(&self.min, weights).unwrap_or_default(),
            max: weighted_average(&self.max, weights).unwrap_or_default(),
            percentiles,
        }
    }
}

fn extract_fio(path: &Path, raw: &[u8], config: &ReportConfig) -> Result<OutputMetrics, SummaryError> {
    let record: Value = serde_json::from_slice(raw).map_err(|e| SummaryError::MalformedRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let scheme = FieldScheme::detect(&record);
    let jobs = record
        .get("jobs")
        .and_then(Value::as_array)
        .ok_or_else(|| SummaryError::MalformedRecord {
            path: path.to_path_buf(),
            reason: "missing job list".to_string(),
        })?;

    let mut read = DirectionSamples::default();
    let mut write = DirectionSamples::default();

    for job in jobs {
        collect_job_direction(job, "read", &scheme, config, &mut read)?;
        collect_job_direction(job, "write", &scheme, config, &mut write)?;
    }

    let read_iops = read.total_iops();
    let write_iops = write.total_iops();
    let read_latency = read.weighted_stats();
    let write_latency = write.weighted_stats();

    let mut latency = LatencyStats::blend(&read_latency, &write_latency, read_iops, write_iops);
    if read_iops > 0.0 && write_iops > 0.0 {
        // Combined percentiles re-percentile the per-job bucket figures of
        // both directions at the key's own rank, treating the already
        // bucketed values as samples. This approximates the true global
        // percentile without the raw latency stream and is intentionally
        // kept as the reference tool computed it.
        latency.percentiles = combined_percentiles(&read, &write)?;
    }

    Ok(OutputMetrics {
        iops: read_iops + write_iops,
        read_iops,
        write_iops,
        bandwidth_kbps: read.bw_kbps + write.bw_kbps,
        read_bw_kbps: read.bw_kbps,
        write_bw_kbps: write.bw_kbps,
        latency,
        read_latency,
        write_latency,
    })
}

/// Pull one direction's figures out of one job entry. Every numeric field
/// defaults to 0 when the record omits it; only percentile buckets are
/// allowed to stay absent.
fn collect_job_direction(
    job: &Value,
    direction: &str,
    scheme: &FieldScheme,
    config: &ReportConfig,
    samples: &mut DirectionSamples,
) -> Result<(), SummaryError> {
    let block = job.get(direction).cloned().unwrap_or(Value::Null);

    let job_iops = field(&block, "iops");
    samples.iops.push(job_iops);
    samples.bw_kbps += field(&block, "bw");

    let lat = block.get(scheme.lat_key).cloned().unwrap_or(Value::Null);
    samples.avg.push(to_millis(field(&lat, "mean"), scheme.time_unit)?);
    samples.min.push(to_millis(field(&lat, "min"), scheme.time_unit)?);
    samples.max.push(to_millis(field(&lat, "max"), scheme.time_unit)?);

    if let Some(buckets) = block
        .get(scheme.clat_key)
        .and_then(|clat| clat.get("percentile"))
        .and_then(Value::as_object)
    {
        for (label, value) in buckets {
            let key = match PercentileKey::from_label(label) {
                Some(key) if config.percentiles.contains(&key) => key,
                _ => continue,
            };
            let value_ms = to_millis(value.as_f64().unwrap_or_default(), scheme.time_unit)?;
            samples.pct.entry(key).or_default().push((value_ms, job_iops));
        }
    }

    Ok(())
}

fn field(block: &Value, name: &str) -> f64 {
    block.get(name).and_then(Value::as_f64).unwrap_or_default()
}

fn combined_percentiles(
    read: &DirectionSamples,
    write: &DirectionSamples,
) -> Result<BTreeMap<PercentileKey, f64>, SummaryError> {
    let mut combined = BTreeMap::new();
    let keys = read.pct.keys().chain(write.pct.keys());
    for key in keys {
        if combined.contains_key(key) {
            continue;
        }
        let mut bucket_values = Vec::new();
        if let Some(pairs) = read.pct.get(key) {
            bucket_values.extend(pairs.iter().map(|(v, _)| *v));
        }
        if let Some(pairs) = write.pct.get(key) {
            bucket_values.extend(pairs.iter().map(|(v, _)| *v));
        }
        if !bucket_values.is_empty() {
            combined.insert(*key, percentile(&bucket_values, key.fraction())?);
        }
    }
    Ok(combined)
}

/// Raw record shape for the single-stream family: direct scalars with
/// declared unit labels, no read/write split, no percentile buckets.
#[derive(Debug, Deserialize)]
struct SingleStreamRecord {
    #[serde(default)]
    iops: f64,
    #[serde(default)]
    bandwidth: f64,
    #[serde(default = "default_rate_unit")]
    bandwidth_unit: String,
    #[serde(default)]
    latency: SingleStreamLatency,
}

#[derive(Debug, Deserialize)]
struct SingleStreamLatency {
    #[serde(default)]
    avg: f64,
    #[serde(default)]
    min: f64,
    #[serde(default)]
    max: f64,
    #[serde(default = "default_time_unit")]
    unit: String,
}

impl Default for SingleStreamLatency {
    fn default() -> Self {
        SingleStreamLatency {
            avg: 0.0,
            min: 0.0,
            max: 0.0,
            unit: default_time_unit(),
        }
    }
}

fn default_rate_unit() -> String {
    "KB/s".to_string()
}

fn default_time_unit() -> String {
    "msec".to_string()
}

fn extract_single_stream(path: &Path, raw: &[u8]) -> Result<OutputMetrics, SummaryError> {
    let record: SingleStreamRecord =
        serde_json::from_slice(raw).map_err(|e| SummaryError::MalformedRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let latency = LatencyStats {
        avg: to_millis(record.latency.avg, &record.latency.unit)?,
        min: to_millis(record.latency.min, &record.latency.unit)?,
        max: to_millis(record.latency.max, &record.latency.unit)?,
        percentiles: BTreeMap::new(),
    };

    Ok(OutputMetrics {
        iops: record.iops,
        bandwidth_kbps: crate::units::to_kbps(record.bandwidth, &record.bandwidth_unit)?,
        latency,
        ..OutputMetrics::default()
    })
}
