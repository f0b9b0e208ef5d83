//! Benchmark report types written by [`crate::recorder::ResultRecorder`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level report written to a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Schema version, bumped on incompatible layout changes.
    pub schema_version: u32,
    /// Metadata about this run (hardware, git, timestamp).
    pub metadata: RunMetadata,
    /// Individual benchmark results.
    pub results: Vec<BenchmarkResult>,
}

/// Captured once when the recorder is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// ISO 8601 UTC timestamp of the run start.
    pub timestamp: String,
    /// Short git commit hash, when run inside a checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    /// Version of this crate.
    pub crate_version: String,
    /// Hardware information.
    pub hardware: HardwareInfo,
}

/// Host the run executed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// CPU model string.
    pub cpu: String,
    /// Number of logical cores.
    pub cores: usize,
    /// Operating system.
    pub os: String,
    /// CPU architecture.
    pub arch: String,
}

/// One measured run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Benchmark name (e.g. "financier/1k/r4w4/uniform").
    pub benchmark: String,
    /// Category the recorder was created for.
    pub category: String,
    /// Task and round parameters the run was configured with.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    /// Measured metrics.
    pub metrics: BenchmarkMetrics,
}

/// Fields that don't apply to a run are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Successful transactions per wall-clock second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_per_sec: Option<f64>,
    /// Median latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50_ns: Option<u64>,
    /// 95th percentile latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_ns: Option<u64>,
    /// 99th percentile latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99_ns: Option<u64>,
    /// Fastest successful transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ns: Option<u64>,
    /// Slowest successful transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ns: Option<u64>,
    /// Mean latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ns: Option<u64>,
    /// Number of latency samples (successful transactions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    /// Submissions per second between the first and last submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_rate: Option<f64>,
    /// Worker threads that drove the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Failed transactions as a percentage of attempted ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_rate_pct: Option<f64>,
    /// Reads that found a value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_hits: Option<u64>,
    /// Reads that found nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_misses: Option<u64>,
    /// Writes the store accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writes: Option<u64>,
}
