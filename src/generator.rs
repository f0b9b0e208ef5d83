//! Task generation for the read/write workload.
//!
//! Builds batches of [`WorkloadRequest`]s whose keys are drawn from the seeded
//! keyspace `A0..A{n_accounts-1}` with a uniform or Zipf distribution. A fixed
//! seed makes every batch reproducible, and batches can be saved to disk so a
//! later run replays exactly the same transactions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::seeder::record_key;
use crate::workload::WorkloadRequest;

// ---------------------------------------------------------------------------
// Random numbers
// ---------------------------------------------------------------------------

/// Seeded LCG. Fast and reproducible across platforms.
///
/// Same constants and seeding as the YCSB harness's generator, so a given
/// seed yields the same stream in both tools.
#[derive(Debug, Clone)]
pub struct FastRng {
    state: u64,
}

impl FastRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x5DEECE66D,
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Returns a value in [0.0, 1.0).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

// ---------------------------------------------------------------------------
// Key distributions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    Uniform,
    /// Zipf with exponent `s`; index 0 is the hottest key.
    Zipf { s: f64 },
}

impl Distribution {
    pub fn label(&self) -> String {
        match self {
            Self::Uniform => "uniform".to_string(),
            Self::Zipf { s } => format!("zipf(s={})", s),
        }
    }
}

/// Draws account indices in `[0, n)`.
#[derive(Debug, Clone)]
pub enum KeySampler {
    Uniform { n: usize },
    /// Cumulative, normalized weights `1/(k+1)^s`.
    Zipf { cdf: Vec<f64> },
}

impl KeySampler {
    /// `n` must be non-zero; `s` for Zipf must be a positive finite number.
    pub fn new(dist: Distribution, n: usize) -> Result<Self, BenchError> {
        if n == 0 {
            return Err(BenchError::ArgumentFormat {
                name: "nAccounts",
                value: n.to_string(),
            });
        }
        match dist {
            Distribution::Uniform => Ok(Self::Uniform { n }),
            Distribution::Zipf { s } => {
                if !(s.is_finite() && s > 0.0) {
                    return Err(BenchError::ArgumentFormat {
                        name: "zipfs",
                        value: s.to_string(),
                    });
                }
                let mut cdf = Vec::with_capacity(n);
                let mut sum = 0.0;
                for k in 0..n {
                    sum += 1.0 / ((k + 1) as f64).powf(s);
                    cdf.push(sum);
                }
                for c in &mut cdf {
                    *c /= sum;
                }
                Ok(Self::Zipf { cdf })
            }
        }
    }

    pub fn next(&self, rng: &mut FastRng) -> usize {
        match self {
            Self::Uniform { n } => ((rng.next_f64() * *n as f64) as usize).min(n - 1),
            Self::Zipf { cdf } => {
                let u = rng.next_f64();
                cdf.partition_point(|&c| c <= u).min(cdf.len() - 1)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Task batches
// ---------------------------------------------------------------------------

/// Parameters for one batch of generated transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub n_txn: usize,
    pub n_accounts: usize,
    pub delay_millis: u64,
    pub n_reads: usize,
    pub n_writes: usize,
    pub update_size: usize,
    pub distribution: Distribution,
    pub seed: u64,
}

impl TaskSpec {
    /// Generate `n_txn` requests. Every key lies in the seeded keyspace.
    pub fn generate(&self) -> Result<Vec<WorkloadRequest>, BenchError> {
        let needs_keys = self.n_txn > 0 && self.n_reads + self.n_writes > 0;
        if !needs_keys {
            return (0..self.n_txn)
                .map(|_| self.request(Vec::new(), Vec::new()))
                .collect();
        }

        let sampler = KeySampler::new(self.distribution, self.n_accounts)?;
        let mut rng = FastRng::new(self.seed);
        let mut next_key = || record_key(sampler.next(&mut rng) as u64);

        let mut tasks = Vec::with_capacity(self.n_txn);
        for _ in 0..self.n_txn {
            let read_keys = (0..self.n_reads).map(|_| next_key()).collect();
            let write_keys = (0..self.n_writes).map(|_| next_key()).collect();
            tasks.push(self.request(read_keys, write_keys)?);
        }
        Ok(tasks)
    }

    fn request(
        &self,
        read_keys: Vec<String>,
        write_keys: Vec<String>,
    ) -> Result<WorkloadRequest, BenchError> {
        let delay = i64::try_from(self.delay_millis).map_err(|_| BenchError::ArgumentFormat {
            name: "delayMillis",
            value: self.delay_millis.to_string(),
        })?;
        WorkloadRequest::new(delay, read_keys, write_keys, self.update_size)
    }
}

/// A generated batch together with the parameters that produced it.
///
/// Replayed runs label and record themselves from `spec`, never from the
/// parameters of the replaying process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    pub spec: TaskSpec,
    pub tasks: Vec<WorkloadRequest>,
}

impl TaskFile {
    pub fn generate(spec: &TaskSpec) -> Result<Self, BenchError> {
        Ok(Self {
            spec: spec.clone(),
            tasks: spec.generate()?,
        })
    }

    /// Load `path` if it exists; otherwise generate from `spec` and save
    /// the batch there.
    pub fn load_or_generate(path: &Path, spec: &TaskSpec) -> Result<Self, BenchError> {
        if path.exists() {
            tracing::info!(path = %path.display(), "replaying task file");
            return load_tasks(path);
        }
        let file = Self::generate(spec)?;
        save_tasks(path, &file)?;
        tracing::info!(path = %path.display(), count = file.tasks.len(), "task file written");
        Ok(file)
    }
}

/// Write a task batch as JSON.
pub fn save_tasks(path: &Path, file: &TaskFile) -> Result<(), BenchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a task batch written by [`save_tasks`].
pub fn load_tasks(path: &Path) -> Result<TaskFile, BenchError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(distribution: Distribution) -> TaskSpec {
        TaskSpec {
            n_txn: 50,
            n_accounts: 20,
            delay_millis: 0,
            n_reads: 3,
            n_writes: 2,
            update_size: 8,
            distribution,
            seed: 7,
        }
    }

    #[test]
    fn same_spec_same_tasks() {
        let a = spec(Distribution::Uniform).generate().unwrap();
        let b = spec(Distribution::Uniform).generate().unwrap();
        assert_eq!(a, b);

        let mut other = spec(Distribution::Uniform);
        other.seed = 8;
        assert_ne!(a, other.generate().unwrap());
    }

    #[test]
    fn keys_stay_in_keyspace() {
        for dist in [Distribution::Uniform, Distribution::Zipf { s: 1.2 }] {
            let tasks = spec(dist).generate().unwrap();
            assert_eq!(tasks.len(), 50);
            for task in &tasks {
                assert_eq!(task.read_keys().len(), 3);
                assert_eq!(task.write_keys().len(), 2);
                assert_eq!(task.update_payload_size(), 8);
                for key in task.read_keys().iter().chain(task.write_keys()) {
                    let index: usize = key.strip_prefix('A').unwrap().parse().unwrap();
                    assert!(index < 20, "{} outside keyspace", key);
                }
            }
        }
    }

    #[test]
    fn zipf_favors_low_indices() {
        let sampler = KeySampler::new(Distribution::Zipf { s: 1.5 }, 100).unwrap();
        let mut rng = FastRng::new(42);
        let mut counts = [0usize; 100];
        for _ in 0..10_000 {
            counts[sampler.next(&mut rng)] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[50]);
    }

    #[test]
    fn rejects_empty_keyspace() {
        let mut s = spec(Distribution::Uniform);
        s.n_accounts = 0;
        assert!(matches!(
            s.generate(),
            Err(BenchError::ArgumentFormat { name: "nAccounts", .. })
        ));

        // No keys needed, so an empty keyspace is fine.
        s.n_reads = 0;
        s.n_writes = 0;
        assert_eq!(s.generate().unwrap().len(), 50);
    }

    #[test]
    fn rejects_bad_zipf_exponent() {
        assert!(KeySampler::new(Distribution::Zipf { s: 0.0 }, 10).is_err());
        assert!(KeySampler::new(Distribution::Zipf { s: f64::NAN }, 10).is_err());
    }
}
