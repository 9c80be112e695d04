use std::path::PathBuf;
use thiserror::Error;

/// Error kinds raised by the extraction and aggregation engine.
///
/// Every variant is fatal to the single test it concerns; the run-level
/// driver isolates failures per test and keeps processing siblings.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A percentile was requested over an empty sample set. Callers must
    /// special-case zero-length inputs rather than treating this as zero.
    #[error("cannot compute a percentile over an empty sample set")]
    EmptyInput,

    /// The source record is structurally invalid for its declared variant
    /// (e.g. a fio record without a `jobs` array).
    #[error("malformed record in {path}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    /// The benchmark name does not map to any supported variant.
    #[error("unknown benchmark variant: {0}")]
    UnknownVariant(String),

    /// `aggregate` was invoked on a test with no contributing outputs.
    /// All statistics are undefined; this must never silently become a
    /// zero-valued summary.
    #[error("test {0} has no parsable output files")]
    NoOutputs(String),

    /// A rate or time unit label outside the recognized set. The reference
    /// tool scaled unknown units by zero; that silent foot-gun is replaced
    /// by this error.
    #[error("unknown unit label: {0}")]
    UnknownUnit(String),
}
