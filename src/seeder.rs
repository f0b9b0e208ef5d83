//! Populates the keyspace with fixed-size filler records.

use crate::error::BenchError;
use crate::observe::Observer;
use crate::store::KvStore;

/// Key holding the decimal count of successfully seeded records.
pub const RECORD_COUNT_KEY: &str = "nRecords";

/// Filler byte for seeded records.
pub const SEED_FILLER: u8 = b'i';

/// Format a record key: `A{index}`.
pub fn record_key(index: u64) -> String {
    format!("A{}", index)
}

/// Writes `n_records` identical records under `A0..A{n-1}` followed by the
/// counter record.
///
/// Seeding is best-effort: the first failing record put truncates the batch
/// without failing the call, and nothing already written is rolled back. Only
/// a failure to write the counter record is reported as an error.
pub struct Seeder<S, O> {
    store: S,
    observer: O,
}

impl<S: KvStore, O: Observer> Seeder<S, O> {
    pub fn new(store: S, observer: O) -> Self {
        Self { store, observer }
    }

    /// Seed the store and return how many records were written.
    pub fn seed(&self, n_records: u64, record_size: usize) -> Result<u64, BenchError> {
        let payload = vec![SEED_FILLER; record_size];

        let mut written = 0u64;
        for index in 0..n_records {
            let key = record_key(index);
            if let Err(err) = self.store.put(&key, &payload) {
                self.observer.seed_put_failed(&key, &err);
                break;
            }
            written += 1;
        }

        self.store
            .put(RECORD_COUNT_KEY, written.to_string().as_bytes())
            .map_err(BenchError::SeedPersist)?;

        self.observer.seed_completed(written);
        Ok(written)
    }
}
