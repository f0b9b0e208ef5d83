//! Shared test stores and observers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use financier_bench::{KvStore, MemoryStore, Observer, StoreError};

// =============================================================================
// Stores
// =============================================================================

/// `MemoryStore` that counts calls and injects failures.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    gets: AtomicUsize,
    puts: AtomicUsize,
    /// 0-indexed put call that fails, then every later put too if `sticky`.
    fail_put_at: Option<usize>,
    sticky: bool,
    fail_keys: HashSet<String>,
    fail_get_keys: HashSet<String>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail only the `k`-th put call.
    pub fn failing_put_at(k: usize) -> Self {
        Self {
            fail_put_at: Some(k),
            ..Self::default()
        }
    }

    /// Fail the `k`-th put call and all that follow.
    pub fn failing_from_put(k: usize) -> Self {
        Self {
            fail_put_at: Some(k),
            sticky: true,
            ..Self::default()
        }
    }

    /// Fail every put to one of `keys`.
    pub fn failing_puts_to(keys: &[&str]) -> Self {
        Self {
            fail_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Fail every get of one of `keys`.
    pub fn failing_gets_of(keys: &[&str]) -> Self {
        Self {
            fail_get_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).unwrap()
    }
}

impl KvStore for FaultyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_keys.contains(key) {
            return Err(StoreError::Backend(format!("injected read fault at {}", key)));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        let failing_call = match self.fail_put_at {
            Some(k) if self.sticky => n >= k,
            Some(k) => n == k,
            None => false,
        };
        if failing_call || self.fail_keys.contains(key) {
            return Err(StoreError::Backend(format!("injected write fault at {}", key)));
        }
        self.inner.put(key, value)
    }
}

// =============================================================================
// Observers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SeedPutFailed(String),
    SeedCompleted(u64),
    ReadHit(String, usize),
    ReadMiss(String),
    ReadFailed(String),
    WriteSucceeded(String),
    WriteFailed(String),
}

/// Records every event in order.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Observer for RecordingObserver {
    fn seed_put_failed(&self, key: &str, _err: &StoreError) {
        self.push(Event::SeedPutFailed(key.to_string()));
    }

    fn seed_completed(&self, written: u64) {
        self.push(Event::SeedCompleted(written));
    }

    fn read_hit(&self, key: &str, value: &[u8]) {
        self.push(Event::ReadHit(key.to_string(), value.len()));
    }

    fn read_miss(&self, key: &str) {
        self.push(Event::ReadMiss(key.to_string()));
    }

    fn read_failed(&self, key: &str, _err: &StoreError) {
        self.push(Event::ReadFailed(key.to_string()));
    }

    fn write_succeeded(&self, key: &str) {
        self.push(Event::WriteSucceeded(key.to_string()));
    }

    fn write_failed(&self, key: &str, _err: &StoreError) {
        self.push(Event::WriteFailed(key.to_string()));
    }
}

/// Panics when the named key is written.
pub struct PanicOnWrite(pub &'static str);

impl Observer for PanicOnWrite {
    fn write_succeeded(&self, key: &str) {
        if key == self.0 {
            panic!("observer failed on {}", key);
        }
    }
}

pub fn keys(ks: &[&str]) -> Vec<String> {
    ks.iter().map(|k| k.to_string()).collect()
}
