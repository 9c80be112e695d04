use cbt_summary::{
    aggregate::aggregate,
    cli::{PercentileKey, ReportConfig},
    discover::discover_tests,
    extract::extract,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn report_config(pctiles: &[&str]) -> ReportConfig {
    ReportConfig {
        percentiles: pctiles.iter().map(|p| p.parse().unwrap()).collect(),
        split: false,
        csv: false,
        output_file: None,
        dirs: Vec::new(),
    }
}

fn write_fio_client(
    dir: &Path,
    name: &str,
    read: (f64, u64, f64, f64, f64, f64),
    write: (f64, u64, f64, f64, f64, f64),
) {
    let block = |(iops, bw, mean, min, max, p99): (f64, u64, f64, f64, f64, f64)| {
        serde_json::json!({
            "iops": iops,
            "bw": bw,
            "lat_ns": { "mean": mean, "min": min, "max": max },
            "clat_ns": { "percentile": { "99.000000": p99 } }
        })
    };
    let record = serde_json::json!({
        "fio version": "fio-3.16",
        "jobs": [ { "read": block(read), "write": block(write) } ]
    });
    fs::write(dir.join(name), record.to_string()).unwrap();
}

fn write_marker(dir: &Path, benchmark: &str) {
    let config = format!(
        "cluster:\n  benchmark: {}\n  iteration: 0\n  op_size: 4096\n  iodepth: 16\n  mode: randrw\n  rwmixread: 50\n",
        benchmark
    );
    fs::write(dir.join("benchmark_config.yaml"), config).unwrap();
}

#[test]
fn archive_of_two_fio_clients_reduces_to_weighted_summary() {
    let root = TempDir::new().unwrap();
    let test_dir = root.path().join("id-feed/00000000/librbdfio");
    fs::create_dir_all(&test_dir).unwrap();
    write_marker(&test_dir, "librbdfio");

    // Latency figures are nanoseconds in the raw records.
    write_fio_client(
        &test_dir,
        "json_output.0.client-a",
        (100.0, 400, 1e6, 5e5, 4e6, 3e6),
        (300.0, 1200, 3e6, 1e6, 8e6, 7e6),
    );
    write_fio_client(
        &test_dir,
        "json_output.0.client-b",
        (300.0, 1200, 3e6, 1e6, 8e6, 9e6),
        (100.0, 400, 1e6, 5e5, 4e6, 5e6),
    );
    // A truncated client upload: skipped with a diagnostic, not fatal.
    fs::write(test_dir.join("json_output.0.client-c"), "").unwrap();

    let config = report_config(&["99.00"]);
    let tests = discover_tests(root.path()).unwrap();
    assert_eq!(tests.len(), 1);
    let test = &tests[0];
    assert_eq!(test.files.len(), 3);
    assert_eq!(test.metadata.hash_id, "id-feed");

    let mut outputs = Vec::new();
    for file in &test.files {
        if let Some(metrics) = extract(file, test.variant, &config).unwrap() {
            outputs.push(metrics);
        }
    }
    let summary = aggregate(&outputs, test.metadata.clone()).unwrap();

    // The empty file contributed nothing.
    assert_eq!(summary.clients, 2);

    assert_eq!(summary.read_iops, 400.0);
    assert_eq!(summary.write_iops, 400.0);
    assert_eq!(summary.iops, 800.0);
    assert_eq!(summary.bandwidth_kbps, 3200.0);

    // Per-direction weighted averages across the two clients.
    assert!((summary.read_latency.avg - 2.5).abs() < 1e-9);
    assert!((summary.write_latency.avg - 2.5).abs() < 1e-9);
    assert!((summary.read_latency.min - 0.875).abs() < 1e-9);
    assert!((summary.read_latency.max - 7.0).abs() < 1e-9);

    let p99: PercentileKey = "99.00".parse().unwrap();
    assert!((summary.read_latency.percentiles[&p99] - 7.5).abs() < 1e-9);
    assert!((summary.write_latency.percentiles[&p99] - 6.5).abs() < 1e-9);

    // Combined family blends the two directions by their iops totals.
    assert!((summary.latency.avg - 2.5).abs() < 1e-9);
    assert!((summary.latency.percentiles[&p99] - 7.0).abs() < 1e-9);
}

#[test]
fn single_stream_archive_has_combined_family_only() {
    let root = TempDir::new().unwrap();
    let test_dir = root.path().join("id-01/singlestream");
    fs::create_dir_all(&test_dir).unwrap();
    write_marker(&test_dir, "singlestream");

    let record = serde_json::json!({
        "iops": 500.0,
        "bandwidth": 2.0,
        "bandwidth_unit": "MB/s",
        "latency": { "avg": 4000.0, "min": 1000.0, "max": 20000.0, "unit": "usec" }
    });
    fs::write(test_dir.join("json_output.0"), record.to_string()).unwrap();

    let config = report_config(&["99.00"]);
    let tests = discover_tests(root.path()).unwrap();
    assert_eq!(tests.len(), 1);

    let outputs: Vec<_> = tests[0]
        .files
        .iter()
        .filter_map(|f| extract(f, tests[0].variant, &config).unwrap())
        .collect();
    let summary = aggregate(&outputs, tests[0].metadata.clone()).unwrap();

    assert_eq!(summary.iops, 500.0);
    assert_eq!(summary.bandwidth_kbps, 2000.0);
    assert_eq!(summary.latency.avg, 4.0);
    assert_eq!(summary.latency.min, 1.0);
    assert_eq!(summary.latency.max, 20.0);
    // No read/write distinction for this family.
    assert_eq!(summary.read_iops, 0.0);
    assert_eq!(summary.write_iops, 0.0);
    assert!(summary.latency.percentiles.is_empty());
}

#[test]
fn test_with_only_empty_outputs_fails_with_no_outputs() {
    let root = TempDir::new().unwrap();
    let test_dir = root.path().join("id-02/librbdfio");
    fs::create_dir_all(&test_dir).unwrap();
    write_marker(&test_dir, "librbdfio");
    fs::write(test_dir.join("json_output.0"), "").unwrap();

    let config = report_config(&[]);
    let tests = discover_tests(root.path()).unwrap();
    let outputs: Vec<_> = tests[0]
        .files
        .iter()
        .filter_map(|f| extract(f, tests[0].variant, &config).unwrap())
        .collect();

    let err = aggregate(&outputs, tests[0].metadata.clone()).unwrap_err();
    assert!(matches!(err, cbt_summary::SummaryError::NoOutputs(_)));
}
