//! Seeded key-value workload generator and mixed read/write benchmark core.
//!
//! A [`Seeder`] fills any [`KvStore`] with fixed-size records under
//! `A0..A{n-1}` plus a `nRecords` counter; a [`WorkloadRunner`] then executes
//! delayed read/write mixes against it. The [`driver`] fans generated task
//! batches out over worker threads and the [`recorder`] writes JSON reports.

pub mod driver;
pub mod error;
pub mod generator;
pub mod invoke;
pub mod observe;
pub mod recorder;
pub mod schema;
pub mod seeder;
pub mod store;
pub mod workload;

pub use error::BenchError;
pub use observe::{NoopObserver, Observer, TracingObserver};
pub use seeder::{record_key, Seeder, RECORD_COUNT_KEY};
pub use store::{KvStore, MemoryStore, StoreError};
pub use workload::{WorkloadOutcome, WorkloadRequest, WorkloadRunner};
