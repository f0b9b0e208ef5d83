//! Observability port for the seeder and workload runner.
//!
//! The host creates one observer at process start and hands it to each
//! component at construction. Soft failures (read misses, read errors,
//! truncated seeding) only ever surface here, never as call errors.

use std::sync::Arc;

use crate::store::StoreError;

/// Receives events emitted by the benchmark core.
///
/// Every method has an empty default so observers only implement what they
/// care about.
pub trait Observer: Send + Sync {
    /// A seed `put` failed; seeding stops after this record.
    fn seed_put_failed(&self, _key: &str, _err: &StoreError) {}

    /// Seeding finished and the counter record was written.
    fn seed_completed(&self, _written: u64) {}

    fn read_hit(&self, _key: &str, _value: &[u8]) {}

    fn read_miss(&self, _key: &str) {}

    fn read_failed(&self, _key: &str, _err: &StoreError) {}

    fn write_succeeded(&self, _key: &str) {}

    fn write_failed(&self, _key: &str, _err: &StoreError) {}
}

impl<T: Observer + ?Sized> Observer for &T {
    fn seed_put_failed(&self, key: &str, err: &StoreError) {
        (**self).seed_put_failed(key, err)
    }
    fn seed_completed(&self, written: u64) {
        (**self).seed_completed(written)
    }
    fn read_hit(&self, key: &str, value: &[u8]) {
        (**self).read_hit(key, value)
    }
    fn read_miss(&self, key: &str) {
        (**self).read_miss(key)
    }
    fn read_failed(&self, key: &str, err: &StoreError) {
        (**self).read_failed(key, err)
    }
    fn write_succeeded(&self, key: &str) {
        (**self).write_succeeded(key)
    }
    fn write_failed(&self, key: &str, err: &StoreError) {
        (**self).write_failed(key, err)
    }
}

impl<T: Observer + ?Sized> Observer for Arc<T> {
    fn seed_put_failed(&self, key: &str, err: &StoreError) {
        (**self).seed_put_failed(key, err)
    }
    fn seed_completed(&self, written: u64) {
        (**self).seed_completed(written)
    }
    fn read_hit(&self, key: &str, value: &[u8]) {
        (**self).read_hit(key, value)
    }
    fn read_miss(&self, key: &str) {
        (**self).read_miss(key)
    }
    fn read_failed(&self, key: &str, err: &StoreError) {
        (**self).read_failed(key, err)
    }
    fn write_succeeded(&self, key: &str) {
        (**self).write_succeeded(key)
    }
    fn write_failed(&self, key: &str, err: &StoreError) {
        (**self).write_failed(key, err)
    }
}

/// Forwards events to `tracing`.
///
/// Values read from the store are logged by length only; payloads are filler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn seed_put_failed(&self, key: &str, err: &StoreError) {
        tracing::error!(key, error = %err, "failed to insert seed record");
    }

    fn seed_completed(&self, written: u64) {
        tracing::info!(count = written, "seed records inserted");
    }

    fn read_hit(&self, key: &str, value: &[u8]) {
        tracing::debug!(key, len = value.len(), "read value");
    }

    fn read_miss(&self, key: &str) {
        tracing::warn!(key, "key not found");
    }

    fn read_failed(&self, key: &str, err: &StoreError) {
        tracing::error!(key, error = %err, "read failed");
    }

    fn write_succeeded(&self, key: &str) {
        tracing::debug!(key, "value updated");
    }

    fn write_failed(&self, key: &str, err: &StoreError) {
        tracing::error!(key, error = %err, "unable to upsert");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}
