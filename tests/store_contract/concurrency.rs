//! Concurrent writers and binding teardown

use crate::common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_writers_each_notify_once() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    store.on(
        &[path("$.$every")],
        Arc::new(move |_: &ChangeEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let threads = 8;
    let writes = 50;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..writes {
                    store.set(&path(&format!("$.t{t}")), json!(i).into()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), threads * writes);
    assert_eq!(store.version(), (threads * writes) as u64);
    for t in 0..threads {
        assert_eq!(
            store.get(&path(&format!("$.t{t}"))).map(Entity::into_value),
            Some(JsonValue::from(json!(writes - 1)))
        );
    }
}

#[test]
fn teardown_races_with_writers() {
    let h = Harness::new(json!({"count": 0}));
    let mut c = h.mount(BindOptions::new("$.count"));
    let store = Arc::clone(h.store());

    let writer = thread::spawn(move || {
        for i in 1..=200 {
            store.set(&path("$.count"), json!(i).into()).unwrap();
        }
    });
    c.unmount();
    writer.join().unwrap();

    assert_eq!(h.store().listener_count(), 0);
    let delivered = c.replacements();
    h.advance_ms(1_000);
    assert_eq!(c.replacements(), delivered);
    assert_eq!(h.value("$.count"), json!(200));
}
