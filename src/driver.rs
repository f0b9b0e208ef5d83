//! Concurrent benchmark driver.
//!
//! Runs a batch of workload requests over a pool of worker threads that share
//! one store, timing every invocation. A round either issues every task once
//! or keeps cycling through the batch for a fixed duration, and may pace
//! submissions to a fixed target rate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::error::BenchError;
use crate::observe::Observer;
use crate::store::KvStore;
use crate::workload::{WorkloadOutcome, WorkloadRequest, WorkloadRunner};

/// Latency percentiles over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub ops_per_sec: f64,
    pub avg: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub min: Duration,
    pub max: Duration,
}

/// Compute stats; throughput uses `wall_elapsed` when given, otherwise the
/// summed latencies. Returns `None` for an empty sample set.
///
/// Percentile indexing is the one used by the YCSB harness so numbers from
/// both tools line up.
pub fn compute_stats(
    mut latencies: Vec<Duration>,
    wall_elapsed: Option<Duration>,
) -> Option<LatencyStats> {
    if latencies.is_empty() {
        return None;
    }
    latencies.sort_unstable();
    let len = latencies.len();
    let sum: Duration = latencies.iter().sum();
    let elapsed = wall_elapsed.unwrap_or(sum);
    let secs = elapsed.as_secs_f64();

    Some(LatencyStats {
        count: len,
        ops_per_sec: if secs > 0.0 { len as f64 / secs } else { 0.0 },
        avg: sum / len as u32,
        p50: latencies[len * 50 / 100],
        p95: latencies[(len * 95 / 100).min(len - 1)],
        p99: latencies[(len * 99 / 100).min(len - 1)],
        min: latencies[0],
        max: latencies[len - 1],
    })
}

// ---------------------------------------------------------------------------
// Round configuration
// ---------------------------------------------------------------------------

/// Pacing of transaction submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateControl {
    tps: Option<f64>,
}

impl RateControl {
    /// Submit as fast as the workers allow.
    pub fn unlimited() -> Self {
        Self { tps: None }
    }

    /// Submit the i-th transaction no earlier than `i / tps` seconds after
    /// the round starts.
    pub fn fixed(tps: f64) -> Result<Self, BenchError> {
        if !(tps.is_finite() && tps > 0.0) {
            return Err(BenchError::ArgumentFormat {
                name: "tps",
                value: tps.to_string(),
            });
        }
        Ok(Self { tps: Some(tps) })
    }

    pub fn tps(&self) -> Option<f64> {
        self.tps
    }

    /// Offset from the round start at which transaction `index` is due.
    pub fn due(&self, index: usize) -> Option<Duration> {
        self.tps.map(|tps| Duration::from_secs_f64(index as f64 / tps))
    }

    pub fn label(&self) -> String {
        match self.tps {
            Some(tps) => format!("fixed-rate({} tps)", tps),
            None => "unlimited".to_string(),
        }
    }
}

/// How long a round keeps submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Issue every task in the batch exactly once.
    Count,
    /// Cycle through the batch until the duration elapses.
    Duration(Duration),
}

impl DriveMode {
    pub fn label(&self) -> String {
        match self {
            Self::Count => "count".to_string(),
            Self::Duration(d) => format!("{}s", d.as_secs_f64()),
        }
    }
}

/// One test round.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub label: String,
    pub mode: DriveMode,
    pub rate: RateControl,
}

impl Round {
    pub fn new(label: impl Into<String>, mode: DriveMode, rate: RateControl) -> Self {
        Self {
            label: label.into(),
            mode,
            rate,
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new("default", DriveMode::Count, RateControl::unlimited())
    }
}

/// Build the round list from per-round rate and duration settings.
///
/// Round `i` takes the `i`-th entry of each list; a shorter list repeats its
/// last entry. Empty lists mean unpaced, and count mode respectively. Both
/// empty yields the single default round.
pub fn plan_rounds(tps: &[f64], durations_secs: &[f64]) -> Result<Vec<Round>, BenchError> {
    let n = tps.len().max(durations_secs.len()).max(1);
    let pick = |list: &[f64], i: usize| list.get(i).or(list.last()).copied();

    (0..n)
        .map(|i| -> Result<Round, BenchError> {
            let rate = match pick(tps, i) {
                Some(t) => RateControl::fixed(t)?,
                None => RateControl::unlimited(),
            };
            let mode = match pick(durations_secs, i) {
                Some(secs) if secs.is_finite() && secs > 0.0 => {
                    DriveMode::Duration(Duration::from_secs_f64(secs))
                }
                Some(secs) => {
                    return Err(BenchError::ArgumentFormat {
                        name: "duration",
                        value: secs.to_string(),
                    })
                }
                None => DriveMode::Count,
            };
            Ok(Round::new(format!("round-{}", i + 1), mode, rate))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Result of driving one round.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub threads: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures caused by the store rejecting a write.
    pub write_failures: usize,
    pub totals: WorkloadOutcome,
    pub wall_elapsed: Duration,
    /// Time between the first and the last submission.
    pub send_span: Duration,
    /// Latencies of successful invocations.
    pub latencies: Vec<Duration>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn failure_rate_pct(&self) -> f64 {
        match self.attempted() {
            0 => 0.0,
            n => self.failed as f64 * 100.0 / n as f64,
        }
    }

    /// Submissions per second. A round whose submissions all fall within the
    /// same millisecond reports its attempt count.
    pub fn send_rate(&self) -> f64 {
        let attempted = self.attempted() as f64;
        if self.send_span < Duration::from_millis(1) {
            attempted
        } else {
            attempted / self.send_span.as_secs_f64()
        }
    }

    pub fn stats(&self) -> Option<LatencyStats> {
        compute_stats(self.latencies.clone(), Some(self.wall_elapsed))
    }
}

#[derive(Default)]
struct WorkerTally {
    succeeded: usize,
    failed: usize,
    write_failures: usize,
    totals: WorkloadOutcome,
    latencies: Vec<Duration>,
    first_send: Option<Duration>,
    last_send: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Fans a task batch out over `threads` workers.
#[derive(Debug, Clone, Copy)]
pub struct Driver {
    threads: usize,
}

impl Driver {
    /// `threads` is clamped to at least one.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run every task exactly once, unpaced.
    pub fn run<S, O>(&self, store: S, observer: O, tasks: &[WorkloadRequest]) -> RunSummary
    where
        S: KvStore,
        O: Observer,
    {
        self.run_round(store, observer, tasks, &Round::default())
    }

    /// Run rounds back to back against the same store.
    pub fn run_rounds<S, O>(
        &self,
        store: S,
        observer: O,
        tasks: &[WorkloadRequest],
        rounds: &[Round],
    ) -> Vec<RunSummary>
    where
        S: KvStore,
        O: Observer,
    {
        rounds
            .iter()
            .enumerate()
            .map(|(i, round)| {
                tracing::info!(round = i + 1, label = %round.label, "starting round");
                self.run_round(&store, &observer, tasks, round)
            })
            .collect()
    }

    /// Run one round. Failed invocations are counted, not retried.
    ///
    /// A panic inside a worker (for example from an observer) is re-raised
    /// on the calling thread once the other workers have stopped.
    pub fn run_round<S, O>(
        &self,
        store: S,
        observer: O,
        tasks: &[WorkloadRequest],
        round: &Round,
    ) -> RunSummary
    where
        S: KvStore,
        O: Observer,
    {
        let runner = WorkloadRunner::new(store, observer);
        let cursor = AtomicUsize::new(0);
        let workers = match round.mode {
            DriveMode::Count => self.threads.min(tasks.len()).max(1),
            DriveMode::Duration(_) => self.threads,
        };

        tracing::info!(
            tasks = tasks.len(),
            threads = workers,
            mode = %round.mode.label(),
            rate = %round.rate.label(),
            "driving workload"
        );

        let wall_start = Instant::now();
        let tallies: Vec<WorkerTally> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let runner = &runner;
                    let cursor = &cursor;
                    scope.spawn(move || {
                        drive_worker(runner, cursor, tasks, round, wall_start)
                    })
                })
                .collect();

            let mut tallies = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.join() {
                    Ok(tally) => tallies.push(tally),
                    Err(payload) => {
                        tracing::error!(round = %round.label, "worker panicked");
                        std::panic::resume_unwind(payload);
                    }
                }
            }
            tallies
        });
        let wall_elapsed = wall_start.elapsed();

        let mut summary = RunSummary {
            threads: workers,
            succeeded: 0,
            failed: 0,
            write_failures: 0,
            totals: WorkloadOutcome::default(),
            wall_elapsed,
            send_span: Duration::ZERO,
            latencies: Vec::with_capacity(tasks.len()),
        };
        let mut first_send: Option<Duration> = None;
        let mut last_send: Option<Duration> = None;
        for tally in tallies {
            summary.succeeded += tally.succeeded;
            summary.failed += tally.failed;
            summary.write_failures += tally.write_failures;
            summary.totals.merge(&tally.totals);
            summary.latencies.extend(tally.latencies);
            first_send = match (first_send, tally.first_send) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            last_send = last_send.max(tally.last_send);
        }
        if let (Some(first), Some(last)) = (first_send, last_send) {
            summary.send_span = last.saturating_sub(first);
        }

        tracing::info!(
            round = %round.label,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = wall_elapsed.as_millis() as u64,
            "round complete"
        );
        summary
    }
}

fn drive_worker<S: KvStore, O: Observer>(
    runner: &WorkloadRunner<S, O>,
    cursor: &AtomicUsize,
    tasks: &[WorkloadRequest],
    round: &Round,
    wall_start: Instant,
) -> WorkerTally {
    let mut tally = WorkerTally::default();
    if tasks.is_empty() {
        return tally;
    }

    loop {
        let i = cursor.fetch_add(1, Ordering::Relaxed);
        let task = match round.mode {
            DriveMode::Count => match tasks.get(i) {
                Some(task) => task,
                None => break,
            },
            DriveMode::Duration(_) => &tasks[i % tasks.len()],
        };

        if let Some(due) = round.rate.due(i) {
            if let DriveMode::Duration(limit) = round.mode {
                if due >= limit {
                    break;
                }
            }
            let wait = due.saturating_sub(wall_start.elapsed());
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
        if let DriveMode::Duration(limit) = round.mode {
            if wall_start.elapsed() >= limit {
                break;
            }
        }

        let start = Instant::now();
        let sent = start.duration_since(wall_start);
        if tally.first_send.is_none() {
            tally.first_send = Some(sent);
        }
        tally.last_send = Some(sent);

        match runner.run(task) {
            Ok(outcome) => {
                tally.latencies.push(start.elapsed());
                tally.totals.merge(&outcome);
                tally.succeeded += 1;
            }
            Err(err) => {
                if err.is_store_failure() {
                    tally.write_failures += 1;
                }
                tracing::debug!(task = i, error = %err, "invocation failed");
                tally.failed += 1;
            }
        }
    }
    tally
}
