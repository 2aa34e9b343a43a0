//! Subscribe, re-render, rebind and teardown of mounted components

use crate::common::*;

fn app() -> Harness {
    Harness::new(json!({
        "header": {"text": "React App", "subText": "Is Testing"},
        "footer": {"text": "Bye"},
        "users": [{"name": "ada", "age": 36}, {"name": "grace", "age": 45}]
    }))
}

#[test]
fn mount_registers_one_listener_pair() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    assert_eq!(h.store().listener_count(), 2);
    assert_eq!(h.store().registrations_at(&path("$.header")), 2);
    assert_eq!(h.store().registrations_at(&path("$.header.$every")), 1);

    for _ in 0..5 {
        c.render().unwrap();
        c.binding.mount().unwrap();
    }
    assert_eq!(h.store().listener_count(), 2);
}

#[test]
fn rerender_returns_latest_delivered_value() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    h.advance_ms(50);

    h.set("$.header.text", json!("Renamed"));
    assert_eq!(c.replacements(), 1);
    let entity = c.render().unwrap();
    assert_eq!(entity.path(), &path("$.header"));
    assert_eq!(entity["text"], "Renamed");
}

#[test]
fn rebind_moves_the_subscription() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.users[0]"));
    let first = c.binding.subscription().cloned().unwrap();

    let entity = c.rebind("$.users[1]").unwrap();
    assert_eq!(entity["name"], "grace");
    assert!(first.is_disposed());
    assert_eq!(h.store().listener_count(), 2);
    assert_eq!(h.store().registrations_at(&path("$.users[0]")), 0);
    assert_eq!(h.store().registrations_at(&path("$.users[1]")), 2);

    h.advance_ms(50);
    h.set("$.users[0].age", json!(37));
    assert_eq!(c.replacements(), 0);
    h.set("$.users[1].age", json!(46));
    assert_eq!(c.replacements(), 1);
}

#[test]
fn relative_and_absolute_paths_share_identity() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.footer"));
    let first = c.binding.subscription().cloned().unwrap();

    c.rebind("footer").unwrap();
    assert!(!first.is_disposed());
    assert_eq!(h.store().listener_count(), 2);
}

#[test]
fn unmount_then_mutate_delivers_nothing() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    c.unmount();
    assert_eq!(h.store().listener_count(), 0);

    h.set("$.header.text", json!("Late"));
    h.advance_ms(500);
    assert_eq!(c.replacements(), 0);
    assert_eq!(c.shown()["text"], "React App");
}

#[test]
fn pending_delivery_is_cancelled_by_unmount() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));

    h.set("$.header.text", json!("One"));
    h.set("$.header.text", json!("Two"));
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.binding.coalescer_state(), Some(CoalescerState::PendingTimer));
    assert_eq!(h.provider.timers().pending(), 1);
    let subscription = c.binding.subscription().cloned().unwrap();

    c.unmount();
    assert_eq!(subscription.state(), CoalescerState::Disposed);
    assert_eq!(c.binding.coalescer_state(), None);
    assert_eq!(h.provider.timers().pending(), 0);
    assert_eq!(h.provider.timers().next_deadline(), None);

    assert_eq!(h.advance_ms(100), 0);
    assert_eq!(c.replacements(), 1);
    assert_eq!(c.shown()["text"], "One");
}

#[test]
fn teardown_is_idempotent() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    let subscription = c.binding.subscription().cloned().unwrap();

    c.unmount();
    c.unmount();
    assert!(!subscription.teardown());
    assert_eq!(h.store().listener_count(), 0);
}

#[test]
fn drop_unregisters() {
    let h = app();
    let c = h.mount(BindOptions::new("$.header"));
    assert_eq!(h.store().listener_count(), 2);
    drop(c);
    assert_eq!(h.store().listener_count(), 0);
}

#[test]
fn remount_after_unmount_resubscribes() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));
    c.unmount();

    c.binding.mount().unwrap();
    assert!(c.binding.is_subscribed());
    assert_eq!(h.store().listener_count(), 2);

    h.advance_ms(50);
    h.set("$.header.subText", json!("Back"));
    assert_eq!(c.replacements(), 1);
}

#[test]
fn components_on_same_path_are_independent() {
    let h = app();
    let a = h.mount(BindOptions::new("$.header"));
    let mut b = h.mount(BindOptions::new("$.header"));
    assert_eq!(h.store().listener_count(), 4);

    b.unmount();
    h.set("$.header.text", json!("Only A"));
    h.advance_ms(50);
    assert_eq!(a.replacements(), 1);
    assert_eq!(b.replacements(), 0);
    assert_eq!(h.store().listener_count(), 2);
}

#[test]
fn custom_listen_spec_replaces_default() {
    let h = app();
    let c = h.mount(BindOptions::new("$.header").listen(vec!["subText", "$.footer"]));
    assert_eq!(
        c.binding.subscription().unwrap().listen_paths(),
        &[path("$.header.subText"), path("$.footer")]
    );
    h.advance_ms(50);

    h.set("$.header.text", json!("Ignored"));
    assert_eq!(c.replacements(), 0);

    h.set("$.footer", json!({"text": "Seen"}));
    assert_eq!(c.replacements(), 1);
}

#[test]
fn listen_children_disabled_in_config() {
    let config = BindingConfig {
        default_listen_children: false,
        ..BindingConfig::default()
    };
    let h = Harness::with_config(json!({"header": {"text": "a"}}), config);
    let c = h.mount(BindOptions::new("$.header"));
    assert_eq!(h.store().registrations_at(&path("$.header.$every")), 0);
    h.advance_ms(50);

    h.set("$.header", json!({"text": "b"}));
    assert_eq!(c.replacements(), 1);
}

#[test]
fn failed_render_keeps_previous_subscription() {
    let h = app();
    let mut c = h.mount(BindOptions::new("$.header"));

    let err = c.rebind("$.missing").unwrap_err();
    assert!(matches!(err, BindError::PathNotFound { .. }));
    assert!(c.binding.is_subscribed());
    assert_eq!(c.binding.subscription().unwrap().path(), &path("$.header"));
}
