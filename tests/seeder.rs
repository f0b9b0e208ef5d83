//! Seeding: keys, payload sizes, the record counter and truncation on faults.

mod common;

use common::{Event, FaultyStore, RecordingObserver};
use financier_bench::{
    record_key, BenchError, KvStore, MemoryStore, NoopObserver, Seeder, RECORD_COUNT_KEY,
};

#[test]
fn seeds_three_one_byte_records() {
    let store = MemoryStore::new();
    let written = Seeder::new(&store, NoopObserver).seed(3, 1).unwrap();

    assert_eq!(written, 3);
    for key in ["A0", "A1", "A2"] {
        assert_eq!(store.get(key).unwrap().unwrap().len(), 1, "{}", key);
    }
    assert_eq!(store.get(RECORD_COUNT_KEY).unwrap(), Some(b"3".to_vec()));
    assert_eq!(store.len(), 4);
}

#[test]
fn record_sizes_are_exact() {
    for (n, size) in [(0u64, 0usize), (1, 0), (5, 17), (64, 1000)] {
        let store = MemoryStore::new();
        let written = Seeder::new(&store, NoopObserver).seed(n, size).unwrap();
        assert_eq!(written, n);

        for i in 0..n {
            let value = store.get(&record_key(i)).unwrap().unwrap();
            assert_eq!(value.len(), size);
        }
        assert!(store.get(&record_key(n)).unwrap().is_none());
        assert_eq!(
            store.get(RECORD_COUNT_KEY).unwrap(),
            Some(n.to_string().into_bytes())
        );
    }
}

#[test]
fn zero_records_still_writes_counter() {
    let store = MemoryStore::new();
    assert_eq!(Seeder::new(&store, NoopObserver).seed(0, 100).unwrap(), 0);
    assert_eq!(store.keys(), vec![RECORD_COUNT_KEY.to_string()]);
    assert_eq!(store.get(RECORD_COUNT_KEY).unwrap(), Some(b"0".to_vec()));
}

#[test]
fn failed_put_truncates_batch() {
    let store = FaultyStore::failing_put_at(4);
    let observer = RecordingObserver::new();

    let written = Seeder::new(&store, &observer).seed(10, 8).unwrap();

    assert_eq!(written, 4);
    // 5 record puts (the last failing) plus the counter.
    assert_eq!(store.puts(), 6);
    for i in 0..4 {
        assert_eq!(store.value(&record_key(i)).unwrap().len(), 8);
    }
    for i in 4..10 {
        assert!(store.value(&record_key(i)).is_none());
    }
    assert_eq!(store.value(RECORD_COUNT_KEY), Some(b"4".to_vec()));
    assert_eq!(
        observer.events(),
        vec![Event::SeedPutFailed("A4".into()), Event::SeedCompleted(4)]
    );
}

#[test]
fn first_put_failing_writes_zero_count() {
    let store = FaultyStore::failing_put_at(0);
    assert_eq!(Seeder::new(&store, NoopObserver).seed(3, 2).unwrap(), 0);
    assert_eq!(store.value(RECORD_COUNT_KEY), Some(b"0".to_vec()));
}

#[test]
fn counter_write_failure_is_fatal() {
    let store = FaultyStore::failing_puts_to(&[RECORD_COUNT_KEY]);
    let observer = RecordingObserver::new();

    let err = Seeder::new(&store, &observer).seed(3, 2).unwrap_err();

    assert!(matches!(err, BenchError::SeedPersist(_)));
    assert!(err.is_store_failure());
    // Records written before the failure stay in place.
    assert_eq!(store.inner.len(), 3);
    assert!(observer.events().is_empty());
}

#[test]
fn reseeding_is_idempotent() {
    let store = MemoryStore::new();
    let seeder = Seeder::new(&store, NoopObserver);
    seeder.seed(20, 4).unwrap();
    let first = store.keys();
    seeder.seed(20, 4).unwrap();

    assert_eq!(store.keys(), first);
    assert_eq!(store.get("A19").unwrap(), Some(b"iiii".to_vec()));
}
