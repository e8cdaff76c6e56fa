use std::{sync::Arc, time::Duration};

use shared::{
    domain::{ModeId, ModeRegistry},
    protocol::Topics,
};

use super::*;

fn registry() -> Arc<ModeRegistry> {
    Arc::new(ModeRegistry::builtin())
}

#[tokio::test]
async fn starts_in_default_mode_entered_and_disconnected() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.current, ModeId(3));
    assert!(snapshot.entered);
    assert!(!snapshot.connected);
}

#[tokio::test]
async fn exact_command_selects_mode_and_marks_entry() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let initial = state.snapshot().await;
    state.clear_entered(initial.generation).await;

    let selected = state.apply_command("Wifi", &registry).await;

    assert_eq!(selected, ModeId(1));
    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.current, ModeId(1));
    assert!(snapshot.entered);
}

#[tokio::test]
async fn unknown_command_falls_back_to_default() {
    let registry = registry();
    let state = ControlHandle::new(ModeId(5));
    let initial = state.snapshot().await;
    state.clear_entered(initial.generation).await;

    let selected = state.apply_command("Bogus", &registry).await;

    assert_eq!(selected, registry.default_mode());
    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.current, registry.default_mode());
    assert!(snapshot.entered);
}

#[tokio::test]
async fn repeated_command_marks_fresh_entry_each_time() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());

    state.apply_command("Wifi", &registry).await;
    let first = state.snapshot().await;
    state.clear_entered(first.generation).await;
    assert!(!state.snapshot().await.entered);

    // Re-entering the mode already shown still counts as a fresh entry.
    state.apply_command("Wifi", &registry).await;
    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.current, ModeId(1));
    assert!(snapshot.entered);
}

#[tokio::test]
async fn stale_clear_leaves_a_racing_entry_intact() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let before = state.snapshot().await;

    // A command lands after the render pass took its snapshot. The
    // pass's clear must not consume the fresh entry.
    state.apply_command("Wifi", &registry).await;
    state.clear_entered(before.generation).await;

    let snapshot = state.snapshot().await;
    assert!(snapshot.entered);
    state.clear_entered(snapshot.generation).await;
    assert!(!state.snapshot().await.entered);
}

#[tokio::test]
async fn corrects_out_of_range_id_to_default() {
    let registry = registry();
    let state = ControlHandle::new(ModeId(99));

    let corrected = state.correct(&registry).await;

    assert_eq!(corrected, registry.default_mode());
    assert_eq!(state.snapshot().await.current, registry.default_mode());
}

#[tokio::test]
async fn handler_applies_raw_command_payloads() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let handler = ModeCommandHandler::new(state.clone(), Arc::clone(&registry));

    handler.on_command(b"RAM").await;
    assert_eq!(state.snapshot().await.current, ModeId(7));

    // Payloads that are not valid UTF-8 cannot match a name.
    handler.on_command(&[0xff, 0xfe, 0x00]).await;
    assert_eq!(state.snapshot().await.current, registry.default_mode());
}

#[tokio::test]
async fn connectivity_follows_channel_callbacks() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let handler = ModeCommandHandler::new(state.clone(), registry);

    assert!(!state.snapshot().await.connected);
    handler.on_connected().await;
    assert!(state.snapshot().await.connected);
    handler.on_disconnected("connection reset").await;
    assert!(!state.snapshot().await.connected);
}

#[tokio::test]
async fn commands_while_disconnected_still_transition() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let handler = ModeCommandHandler::new(state.clone(), Arc::clone(&registry));

    handler.on_disconnected("broker unreachable").await;
    handler.on_command(b"Clock").await;

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.current, ModeId(3));
    assert!(snapshot.entered);
    assert!(!snapshot.connected);
}

#[tokio::test]
async fn shutdown_stays_bounded_without_a_reachable_broker() {
    let registry = registry();
    let state = ControlHandle::new(registry.default_mode());
    let handler = Arc::new(ModeCommandHandler::new(state.clone(), registry));
    let config = BrokerConfig {
        host: "127.0.0.1".into(),
        port: 1,
        ..BrokerConfig::default()
    };
    let link = MqttLink::connect(&config, Topics::default(), handler);

    // With no broker the queued offline publish can never flush, so
    // shutdown gives up after its flush window instead of hanging.
    tokio::time::timeout(Duration::from_secs(30), link.shutdown())
        .await
        .expect("shutdown returns once the flush window closes");
    assert!(!state.snapshot().await.connected);
}
