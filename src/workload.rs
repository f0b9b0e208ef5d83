//! Mixed read/write workload execution.
//!
//! A single invocation waits for its injected delay, reads every read key
//! (tolerating misses and read errors), then overwrites every write key with a
//! fixed-size payload, stopping at the first failed write.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::observe::Observer;
use crate::store::KvStore;

/// Filler byte for payloads written by the workload, distinct from the seed
/// filler so updated records can be told apart.
pub const UPDATE_FILLER: u8 = b'w';

/// Number of scalar arguments preceding the key lists in the flat convention.
pub const SCALAR_ARGS: usize = 4;

/// One workload invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRequest {
    delay_millis: u64,
    read_keys: Vec<String>,
    write_keys: Vec<String>,
    update_payload_size: usize,
}

impl WorkloadRequest {
    /// Build a request, rejecting a negative delay.
    pub fn new(
        delay_millis: i64,
        read_keys: Vec<String>,
        write_keys: Vec<String>,
        update_payload_size: usize,
    ) -> Result<Self, BenchError> {
        if delay_millis < 0 {
            return Err(BenchError::NegativeDelay(delay_millis));
        }
        Ok(Self {
            delay_millis: delay_millis as u64,
            read_keys,
            write_keys,
            update_payload_size,
        })
    }

    /// Decode the flat positional convention:
    /// `delayMillis, nReads, nWrites, updatePayloadSize, readKeys.., writeKeys..`.
    pub fn from_args<A: AsRef<str>>(args: &[A]) -> Result<Self, BenchError> {
        if args.len() < SCALAR_ARGS {
            return Err(BenchError::ArgumentCount {
                expected: SCALAR_ARGS,
                actual: args.len(),
            });
        }

        let delay_millis: i64 = parse_arg("delayMillis", args[0].as_ref())?;
        let n_reads: usize = parse_arg("nReads", args[1].as_ref())?;
        let n_writes: usize = parse_arg("nWrites", args[2].as_ref())?;
        let update_payload_size: usize = parse_arg("updatePayloadSize", args[3].as_ref())?;

        if delay_millis < 0 {
            return Err(BenchError::NegativeDelay(delay_millis));
        }

        let expected = SCALAR_ARGS
            .saturating_add(n_reads)
            .saturating_add(n_writes);
        if args.len() != expected {
            return Err(BenchError::ArgumentCount {
                expected,
                actual: args.len(),
            });
        }

        let read_end = SCALAR_ARGS + n_reads;
        let collect = |range: &[A]| -> Vec<String> {
            range.iter().map(|k| k.as_ref().to_string()).collect()
        };

        Self::new(
            delay_millis,
            collect(&args[SCALAR_ARGS..read_end]),
            collect(&args[read_end..]),
            update_payload_size,
        )
    }

    /// Encode back into the flat positional convention.
    pub fn to_args(&self) -> Vec<String> {
        let capacity = SCALAR_ARGS + self.read_keys.len() + self.write_keys.len();
        let mut args = Vec::with_capacity(capacity);
        args.push(self.delay_millis.to_string());
        args.push(self.read_keys.len().to_string());
        args.push(self.write_keys.len().to_string());
        args.push(self.update_payload_size.to_string());
        args.extend(self.read_keys.iter().cloned());
        args.extend(self.write_keys.iter().cloned());
        args
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }

    pub fn read_keys(&self) -> &[String] {
        &self.read_keys
    }

    pub fn write_keys(&self) -> &[String] {
        &self.write_keys
    }

    pub fn update_payload_size(&self) -> usize {
        self.update_payload_size
    }
}

pub(crate) fn parse_arg<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
) -> Result<T, BenchError> {
    value.parse().map_err(|_| BenchError::ArgumentFormat {
        name,
        value: value.to_string(),
    })
}

/// Counts from one successful invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadOutcome {
    pub hits: u64,
    pub misses: u64,
    pub read_errors: u64,
    pub writes: u64,
}

impl WorkloadOutcome {
    pub fn reads(&self) -> u64 {
        self.hits + self.misses + self.read_errors
    }

    pub fn merge(&mut self, other: &WorkloadOutcome) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.read_errors += other.read_errors;
        self.writes += other.writes;
    }
}

/// Executes workload requests against a store.
///
/// Holds no state between calls; one runner can serve any number of
/// concurrent invocations.
pub struct WorkloadRunner<S, O> {
    store: S,
    observer: O,
}

impl<S: KvStore, O: Observer> WorkloadRunner<S, O> {
    pub fn new(store: S, observer: O) -> Self {
        Self { store, observer }
    }

    pub fn run(&self, request: &WorkloadRequest) -> Result<WorkloadOutcome, BenchError> {
        let mut outcome = WorkloadOutcome::default();

        let delay = request.delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        for key in &request.read_keys {
            match self.store.get(key) {
                Ok(Some(value)) => {
                    outcome.hits += 1;
                    self.observer.read_hit(key, &value);
                }
                Ok(None) => {
                    outcome.misses += 1;
                    self.observer.read_miss(key);
                }
                Err(err) => {
                    outcome.read_errors += 1;
                    self.observer.read_failed(key, &err);
                }
            }
        }

        let payload = vec![UPDATE_FILLER; request.update_payload_size];

        for key in &request.write_keys {
            if let Err(source) = self.store.put(key, &payload) {
                self.observer.write_failed(key, &source);
                return Err(BenchError::WriteFailure {
                    key: key.clone(),
                    source,
                });
            }
            outcome.writes += 1;
            self.observer.write_succeeded(key);
        }

        Ok(outcome)
    }
}
