//! Archive traversal and test grouping.
//!
//! A CBT archive is a directory tree where each test output directory is
//! marked by a `benchmark_config.yaml` file; the client output files sit
//! next to the marker. Discovery resolves each marker into a
//! [`DiscoveredTest`]: the test metadata, its benchmark variant and the
//! candidate output files. No parsing of the output files happens here.

use crate::aggregate::TestMetadata;
use crate::extract::BenchmarkVariant;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// One logical test boundary: resolved file list plus declared variant.
#[derive(Debug, Clone)]
pub struct DiscoveredTest {
    pub metadata: TestMetadata,
    pub variant: BenchmarkVariant,
    pub files: Vec<PathBuf>,
}

/// The slice of `benchmark_config.yaml` the summary needs. CBT stores the
/// effective benchmark settings under the `cluster` mapping.
#[derive(Debug, Deserialize)]
struct BenchmarkConfigFile {
    cluster: ClusterSection,
}

#[derive(Debug, Deserialize)]
struct ClusterSection {
    benchmark: String,
    #[serde(default)]
    iteration: i64,
    #[serde(default)]
    op_size: i64,
    #[serde(default)]
    iodepth: i64,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    rwmixread: i64,
}

/// Walk an archive directory and group its output files by logical test.
///
/// A test whose benchmark name maps to no supported variant is logged and
/// dropped; sibling tests are unaffected.
pub fn discover_tests(root: &Path) -> Result<Vec<DiscoveredTest>> {
    let mut tests = Vec::new();
    walk(root, &mut tests)
        .with_context(|| format!("failed to traverse archive {}", root.display()))?;
    debug!("discovered {} test(s) under {}", tests.len(), root.display());
    Ok(tests)
}

fn walk(dir: &Path, tests: &mut Vec<DiscoveredTest>) -> Result<()> {
    let marker = dir.join(crate::defaults::TEST_MARKER);
    if marker.is_file() {
        match resolve_test(dir, &marker) {
            Ok(test) => tests.push(test),
            Err(e) => error!("skipping test at {}: {:#}", dir.display(), e),
        }
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, tests)?;
        }
    }
    Ok(())
}

fn resolve_test(dir: &Path, marker: &Path) -> Result<DiscoveredTest> {
    let contents = fs::read_to_string(marker)?;
    let config: BenchmarkConfigFile = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid benchmark config {}", marker.display()))?;

    let variant = BenchmarkVariant::from_benchmark_name(&config.cluster.benchmark)?;
    let metadata = TestMetadata {
        benchmark: config.cluster.benchmark,
        iteration: config.cluster.iteration,
        op_size: config.cluster.op_size,
        io_depth: config.cluster.iodepth,
        mode: config.cluster.mode,
        rwmixread: config.cluster.rwmixread,
        hash_id: hash_id_from_path(dir),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_output = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.contains(crate::defaults::OUTPUT_FILE_TOKEN))
            .unwrap_or(false);
        if path.is_file() && is_output {
            files.push(path);
        }
    }
    files.sort();

    Ok(DiscoveredTest {
        metadata,
        variant,
        files,
    })
}

/// The archive id is the path component starting with `id`, when present.
fn hash_id_from_path(dir: &Path) -> String {
    dir.iter()
        .filter_map(|part| part.to_str())
        .find(|part| part.starts_with("id"))
        .unwrap_or_default()
        .to_string()
}
