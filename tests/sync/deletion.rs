//! Deleting bound entities tears their subscriptions down

use crate::common::*;

fn app() -> Harness {
    Harness::new(json!({
        "header": {"text": "React App", "subText": "Is Testing"},
        "footer": {"text": "Bye"},
        "users": ["ada", "grace", "linus"]
    }))
}

#[test]
fn deleting_bound_entity_removes_both_listeners() {
    let h = app();
    let c = h.mount(BindOptions::new("$.header"));

    h.delete("$.header");
    assert!(!c.binding.is_subscribed());
    assert_eq!(h.store().listener_count(), 0);
    assert_eq!(h.store().registrations_at(&path("$.header")), 0);
    assert_eq!(h.store().registrations_at(&path("$.header.$every")), 0);
}

#[test]
fn deleting_an_ancestor_counts_as_deletion() {
    let h = app();
    let c = h.mount(BindOptions::new("$.users[0]"));

    h.delete("$.users");
    assert!(!c.binding.is_subscribed());
    assert_eq!(h.store().listener_count(), 0);
}

#[test]
fn deleting_a_sibling_keeps_subscription() {
    let h = app();
    let c = h.mount(BindOptions::new("$.header"));

    h.delete("$.footer");
    h.delete("$.header.subText");
    assert!(c.binding.is_subscribed());
    assert_eq!(h.store().listener_count(), 2);
}

#[test]
fn array_removal_shifts_later_bindings() {
    let h = app();
    let mut first = h.mount(BindOptions::new("$.users[0]"));
    let second = h.mount(BindOptions::new("$.users[1]"));
    let third = h.mount(BindOptions::new("$.users[2]"));
    h.advance_ms(50);

    h.delete("$.users[0]");

    // The index that now holds "grace" lost its original entity.
    assert!(!first.binding.is_subscribed());
    // Index 1 now holds what used to be index 2.
    assert!(second.binding.is_subscribed());
    assert_eq!(second.replacements(), 1);
    assert_eq!(second.shown_json(), json!("linus"));
    // Index 2 no longer exists.
    assert!(!third.binding.is_subscribed());
    assert_eq!(third.replacements(), 0);
    assert_eq!(h.store().listener_count(), 2);

    let entity = first.render().unwrap();
    assert_eq!(entity.value().as_inner(), &json!("grace"));
    assert!(first.binding.is_subscribed());
}

#[test]
fn pending_delivery_is_dropped_on_deletion() {
    let h = app();
    let c = h.mount(BindOptions::new("$.header"));

    h.set("$.header.text", json!("Shown"));
    h.set("$.header.text", json!("Soon gone"));
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.binding.coalescer_state(), Some(CoalescerState::PendingTimer));
    h.delete("$.header");
    assert_eq!(h.provider.timers().pending(), 0);

    assert_eq!(h.advance_ms(100), 0);
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.shown()["text"], "Shown");
}

#[test]
fn recreation_requires_a_fresh_render() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    h.delete("$.header");

    let err = c.render().unwrap_err();
    assert!(matches!(err, BindError::PathNotFound { .. }));

    h.set("$.header", json!({"text": "Back"}));
    h.advance_ms(50);
    assert_eq!(c.replacements(), 0);

    let entity = c.render().unwrap();
    assert_eq!(entity["text"], "Back");
    assert!(c.binding.is_subscribed());
    assert_eq!(h.store().listener_count(), 2);

    h.advance_ms(50);
    h.set("$.header.text", json!("Live again"));
    assert_eq!(c.replacements(), 1);
}

#[test]
fn deletion_then_create_if_missing_rebuilds_from_template() {
    let h = app();
    let options = BindOptions::new("$.header")
        .initial_value(json!({"text": "Default", "subText": ""}))
        .create_if_missing(true);
    let mut c = h.mount(options);
    h.delete("$.header");

    let entity = c.render().unwrap();
    assert_eq!(entity["text"], "Default");
    assert_eq!(h.value("$.header"), json!({"text": "Default", "subText": ""}));
    assert!(c.binding.is_subscribed());
}

#[test]
fn unmount_after_deletion_is_harmless() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    h.delete("$.header");
    c.unmount();
    c.unmount();
    assert_eq!(h.store().listener_count(), 0);
}
