//! Saves benchmark results as JSON reports.
//!
//! Files land in `results/` (or a caller-chosen directory) and are named
//! `<category>-<timestamp>-<commit>.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::driver::RunSummary;
use crate::error::BenchError;
use crate::schema::{BenchmarkMetrics, BenchmarkReport, BenchmarkResult, HardwareInfo, RunMetadata};

pub const SCHEMA_VERSION: u32 = 1;

/// Accumulates results for one category and writes them in one report.
pub struct ResultRecorder {
    category: String,
    metadata: RunMetadata,
    results: Vec<BenchmarkResult>,
}

impl ResultRecorder {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            metadata: RunMetadata {
                timestamp: utc_timestamp(),
                git_commit: git_short_commit(),
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                hardware: capture_hardware(),
            },
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn record(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Record a driver run. Latency fields are left empty when no invocation
    /// succeeded.
    pub fn record_run(
        &mut self,
        name: &str,
        parameters: HashMap<String, serde_json::Value>,
        summary: &RunSummary,
    ) {
        let mut metrics = BenchmarkMetrics {
            threads: Some(summary.threads),
            failure_rate_pct: Some(summary.failure_rate_pct()),
            send_rate: Some(summary.send_rate()),
            read_hits: Some(summary.totals.hits),
            read_misses: Some(summary.totals.misses),
            writes: Some(summary.totals.writes),
            ..Default::default()
        };
        if let Some(s) = summary.stats() {
            metrics.ops_per_sec = Some(s.ops_per_sec);
            metrics.p50_ns = Some(s.p50.as_nanos() as u64);
            metrics.p95_ns = Some(s.p95.as_nanos() as u64);
            metrics.p99_ns = Some(s.p99.as_nanos() as u64);
            metrics.min_ns = Some(s.min.as_nanos() as u64);
            metrics.max_ns = Some(s.max.as_nanos() as u64);
            metrics.avg_ns = Some(s.avg.as_nanos() as u64);
            metrics.samples = Some(s.count as u64);
        }

        self.results.push(BenchmarkResult {
            benchmark: name.to_string(),
            category: self.category.clone(),
            parameters,
            metrics,
        });
    }

    /// Write to `results/` under the working directory.
    pub fn save(self) -> Result<PathBuf, BenchError> {
        self.save_to(Path::new("results"))
    }

    pub fn save_to(self, dir: &Path) -> Result<PathBuf, BenchError> {
        let commit = self.metadata.git_commit.as_deref().unwrap_or("unknown");
        let filename = format!(
            "{}-{}-{}.json",
            self.category,
            self.metadata.timestamp.replace(':', "-"),
            commit
        );
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);

        let report = BenchmarkReport {
            schema_version: SCHEMA_VERSION,
            metadata: self.metadata,
            results: self.results,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;

        tracing::info!(path = %path.display(), "results saved");
        Ok(path)
    }
}

/// Load a report written by [`ResultRecorder::save_to`].
pub fn load_report(path: &Path) -> Result<BenchmarkReport, BenchError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

fn utc_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format_utc(secs)
}

/// Format seconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SSZ`.
pub(crate) fn format_utc(secs: u64) -> String {
    let (year, month, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

// Howard Hinnant's days-to-civil conversion.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

fn git_short_commit() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn cpu_model() -> String {
    std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|info| {
            info.lines()
                .find(|l| l.starts_with("model name"))
                .and_then(|l| l.split_once(':'))
                .map(|(_, v)| v.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn capture_hardware() -> HardwareInfo {
    HardwareInfo {
        cpu: cpu_model(),
        cores: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(0),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}
