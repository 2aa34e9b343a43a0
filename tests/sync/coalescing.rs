//! Update coalescing through mounted bindings
//!
//! Every test runs on a manual clock with the default 50ms interval unless
//! it says otherwise. Mounting is not a delivery: the first notification
//! after mount goes straight through and opens the first window.

use crate::common::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const W: u64 = 50;

/// Record `(time, value)` for every replacement of `component`
fn record_deliveries(
    h: &Harness,
    component: &TestComponent,
) -> Arc<Mutex<Vec<(Duration, serde_json::Value)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let clock = Arc::clone(&h.clock);
    component.render.set_on_replace(move |entity: &Entity| {
        sink.lock().push((clock.now(), entity.value().clone().into_inner()));
    });
    log
}

#[test]
fn first_notification_after_mount_applies_immediately() {
    let h = Harness::new(json!({"count": 0, "total": 10}));
    let mut c = h.mount(BindOptions::new("$.count"));

    h.set("$.count", json!(1));
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.shown_json(), json!(1));
    assert_eq!(h.provider.timers().pending(), 0);

    // A rebind starts a fresh instance with no delivery on record.
    c.rebind("$.total").unwrap();
    h.set("$.total", json!(11));
    assert_eq!(c.replacements(), 2);
    assert_eq!(c.shown_json(), json!(11));
    assert_eq!(h.provider.timers().pending(), 0);
}

#[test]
fn burst_delivers_first_and_last_value() {
    let h = Harness::new(json!({"count": 0}));
    let c = h.mount(BindOptions::new("$.count"));

    for i in 1..=5 {
        h.set("$.count", json!(i));
        h.advance_ms(5);
    }
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.shown_json(), json!(1));
    assert_eq!(c.binding.coalescer_state(), Some(CoalescerState::PendingTimer));

    h.advance_ms(25);
    assert_eq!(c.replacements(), 2);
    assert_eq!(c.shown_json(), json!(5));

    h.advance_ms(500);
    assert_eq!(c.replacements(), 2);
    assert_eq!(c.binding.coalescer_state(), Some(CoalescerState::Idle));
}

#[test]
fn burst_inside_window_delivers_once_with_last_value() {
    let h = Harness::new(json!({"count": 0}));
    let c = h.mount(BindOptions::new("$.count"));
    h.set("$.count", json!(-1));
    assert_eq!(c.replacements(), 1);

    for i in 1..=5 {
        h.set("$.count", json!(i));
        h.advance_ms(5);
    }
    assert_eq!(c.replacements(), 1);

    h.advance_ms(25);
    assert_eq!(c.replacements(), 2);
    assert_eq!(c.shown_json(), json!(5));
}

#[test]
fn overdue_timer_is_superseded_by_immediate_delivery() {
    let h = Harness::new(json!({"count": 0}));
    let c = h.mount(BindOptions::new("$.count"));
    let log = record_deliveries(&h, &c);

    h.set("$.count", json!(1));
    h.clock.advance_ms(10);
    h.set("$.count", json!(2));
    assert_eq!(h.provider.timers().next_deadline(), Some(Duration::from_millis(W)));

    // The host misses the deadline and only pumps after the next mutation.
    h.clock.advance_ms(60);
    h.set("$.count", json!(3));
    assert_eq!(c.replacements(), 2);
    assert_eq!(h.provider.timers().pending(), 0);

    assert_eq!(h.advance_ms(W * 4), 0);
    assert_eq!(c.replacements(), 2);
    let values: Vec<_> = log.lock().iter().map(|(_, v)| v.clone()).collect();
    assert_eq!(values, vec![json!(1), json!(3)]);
    assert_eq!(c.binding.coalescer_state(), Some(CoalescerState::Idle));
}

#[test]
fn spaced_mutations_are_each_delivered_immediately() {
    let h = Harness::new(json!({"count": 0}));
    let c = h.mount(BindOptions::new("$.count"));
    h.advance_ms(W);

    for i in 1..=4u64 {
        h.set("$.count", json!(i));
        assert_eq!(c.replacements(), i);
        assert_eq!(c.shown_json(), json!(i));
        h.advance_ms(W);
    }
    assert_eq!(h.provider.timers().pending(), 0);
}

#[test]
fn deliveries_never_closer_than_interval() {
    let h = Harness::new(json!({"count": 0}));
    let c = h.mount(BindOptions::new("$.count"));
    let log = record_deliveries(&h, &c);

    for i in 1..=40 {
        h.set("$.count", json!(i));
        h.advance_ms(7);
    }
    h.advance_ms(200);

    let log = log.lock();
    assert!(!log.is_empty());
    assert_eq!(log[0], (Duration::ZERO, json!(1)));
    for pair in log.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(W));
        assert!(pair[1].1.as_i64() >= pair[0].1.as_i64());
    }
    assert_eq!(log.last().map(|(_, v)| v.clone()), Some(json!(40)));
    // One delivery per window across 280ms of mutations, the first at t=0
    assert!(log.len() <= 280 / W as usize + 1);
}

#[test]
fn delivery_reads_fresh_value_not_event_payload() {
    let h = Harness::new(json!({"header": {"text": "a", "subText": "b"}}));
    let c = h.mount(BindOptions::new("$.header"));
    h.set("$.header.subText", json!("opening"));
    assert_eq!(c.replacements(), 1);

    // Only the last event reaches the timer, yet both writes are shown.
    h.set("$.header.text", json!("first"));
    h.set("$.header.subText", json!("second"));
    h.advance_ms(W);

    assert_eq!(c.replacements(), 2);
    assert_eq!(c.shown_json(), json!({"text": "first", "subText": "second"}));
}

#[test]
fn zero_interval_delivers_every_mutation() {
    let config = BindingConfig {
        min_update_interval_ms: 0,
        ..BindingConfig::default()
    };
    let h = Harness::with_config(json!({"count": 0}), config);
    let c = h.mount(BindOptions::new("$.count"));

    for i in 1..=3 {
        h.set("$.count", json!(i));
    }
    assert_eq!(c.replacements(), 3);
    assert_eq!(h.provider.timers().pending(), 0);
}

#[test]
fn interval_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join(pathbind::CONFIG_FILE_NAME);
    BindingConfig {
        min_update_interval_ms: 200,
        ..BindingConfig::default()
    }
    .write_to_file(&file)
    .unwrap();

    let config = BindingConfig::from_file(&file).unwrap();
    let h = Harness::with_config(json!({"count": 0}), config);
    let c = h.mount(BindOptions::new("$.count"));

    h.set("$.count", json!(1));
    assert_eq!(c.replacements(), 1);
    h.advance_ms(150);
    h.set("$.count", json!(2));
    assert_eq!(c.replacements(), 1);

    h.advance_ms(50);
    assert_eq!(c.replacements(), 2);
    assert_eq!(c.shown_json(), json!(2));
}

#[test]
fn unrelated_paths_do_not_wake_binding() {
    let h = Harness::new(json!({"count": 0, "other": {"x": 1}}));
    let c = h.mount(BindOptions::new("$.count"));

    h.set("$.other.x", json!(2));
    h.set("$.sibling", json!(true));
    h.advance_ms(W * 4);

    assert_eq!(c.replacements(), 0);
    assert_eq!(h.provider.timers().pending(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_last_value_wins_within_interval(gaps in prop::collection::vec(0u64..120, 1..25)) {
        let h = Harness::new(json!({"count": 0}));
        let c = h.mount(BindOptions::new("$.count"));
        let log = record_deliveries(&h, &c);

        let n = gaps.len() as u64;
        let mut elapsed = 0;
        for (i, gap) in gaps.iter().enumerate() {
            h.set("$.count", json!(i as u64 + 1));
            h.advance_ms(*gap);
            elapsed += gap;
        }
        h.advance_ms(W * 4);

        let log = log.lock();
        prop_assert!(!log.is_empty());
        prop_assert!(log.len() as u64 <= n);
        // Windows inside the burst plus one trailing delivery after it
        prop_assert!(log.len() as u64 <= elapsed / W + 2);
        for pair in log.windows(2) {
            prop_assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(W));
            prop_assert!(pair[1].1.as_u64() > pair[0].1.as_u64());
        }
        prop_assert_eq!(c.shown_json(), json!(n));
    }
}
