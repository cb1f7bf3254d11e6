#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use common::{start, FakeEngine};
use fridabridge_core::{BridgeError, ErrorKind, NativeError};
use fridabridge_host::config::BridgeConfig;
use fridabridge_host::engine::Engine;
use fridabridge_host::entities::EntityKind;
use fridabridge_host::types::{DeviceType, ScriptRuntime, SpawnOptions};
use fridabridge_host::{Bridge, ScriptState};

#[test]
fn tracing_init_is_idempotent() {
    fridabridge_host::obs::init_tracing("fridabridge=debug");
    fridabridge_host::obs::init_tracing("fridabridge=trace");
}

#[test]
fn start_needs_a_runtime() {
    let engine: Arc<dyn Engine> = FakeEngine::new();
    let err = Bridge::start(engine, BridgeConfig::default()).err().unwrap();
    assert!(matches!(err, BridgeError::Internal(_)));
}

#[tokio::test]
async fn start_rejects_invalid_config() {
    let engine: Arc<dyn Engine> = FakeEngine::new();
    let mut cfg = BridgeConfig::default();
    cfg.ingest.capacity = 1;
    let err = Bridge::start(engine, cfg).err().unwrap();
    assert!(matches!(err, BridgeError::BadRequest(_)));
}

#[tokio::test]
async fn detach_twice_fails_without_touching_engine() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let session = bridge.attach(4242).unwrap();
    assert_eq!(session.pid(), 4242);

    session.detach().unwrap();
    assert!(session.is_detached());
    let before = engine.calls().len();

    assert!(matches!(session.detach(), Err(BridgeError::Released("session"))));
    assert!(matches!(session.enable_jit(), Err(BridgeError::Released("session"))));
    assert!(matches!(
        session.create_script("s", "", ScriptRuntime::Default),
        Err(BridgeError::Released("session"))
    ));
    assert_eq!(engine.calls().len(), before);
}

#[tokio::test]
async fn script_state_machine() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let script = bridge
        .attach(4242)
        .unwrap()
        .create_script("s", "", ScriptRuntime::Duk)
        .unwrap();

    assert_eq!(script.state(), ScriptState::Created);
    script.load().unwrap();
    assert_eq!(script.state(), ScriptState::Loaded);
    script.eternalize().unwrap();
    assert!(!script.is_destroyed().unwrap());
    script.unload().unwrap();
    assert_eq!(script.state(), ScriptState::Unloaded);

    assert!(matches!(script.load(), Err(BridgeError::Released("script"))));
    assert!(matches!(script.unload(), Err(BridgeError::Released("script"))));
    assert!(matches!(
        script.post(&serde_json::json!({}), None),
        Err(BridgeError::Released("script"))
    ));
}

#[tokio::test]
async fn unload_purges_subscriptions_and_inventory() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let session = bridge.attach(4242).unwrap();
    let script = session.create_script("s", "", ScriptRuntime::Default).unwrap();
    let _rx = script.subscribe_messages().unwrap();
    assert_eq!(bridge.pending_correlations(), 1);
    assert!(bridge
        .live_entities()
        .iter()
        .any(|(id, rec)| *id == script.entity_id() && rec.kind == EntityKind::Script && rec.name == "s"));

    script.unload().unwrap();
    assert_eq!(bridge.pending_correlations(), 0);
    assert!(!bridge.live_entities().iter().any(|(id, _)| *id == script.entity_id()));
}

#[tokio::test]
async fn dropping_wrappers_unrefs_handles() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let manager = bridge.device_manager().unwrap();
    let devices = manager.enumerate_devices().unwrap();
    assert_eq!(devices.len(), 2);
    let before = engine.unref_count();

    drop(devices);
    assert_eq!(engine.unref_count(), before + 2);

    manager.close().unwrap();
    assert_eq!(engine.unref_count(), before + 3);
    drop(manager);
    assert_eq!(engine.unref_count(), before + 3);
    assert!(bridge.live_entities().is_empty());
}

#[tokio::test]
async fn native_errors_are_translated() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let device = bridge.device_manager().unwrap().get_local_device().unwrap();

    engine.fail_next(NativeError::engine(3, "unable to find process with pid 99"));
    let err = device.attach(99).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessNotFound);
    assert_eq!(err.native_code(), Some(3));
    assert_eq!(err.to_string(), "unable to find process with pid 99");
}

#[tokio::test]
async fn device_lookup() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let manager = bridge.device_manager().unwrap();

    let local = manager.get_local_device().unwrap();
    assert_eq!(local.id(), "local");
    assert_eq!(local.name(), "Local System");
    assert_eq!(local.kind(), DeviceType::Local);
    assert!(!local.is_lost().unwrap());

    assert_eq!(manager.get_device("socket").unwrap().kind(), DeviceType::Remote);
    assert_eq!(manager.get_remote_device().unwrap().id(), "socket");
    assert!(matches!(manager.get_usb_device(), Err(BridgeError::NoDevice)));
    assert!(matches!(manager.get_device("nope"), Err(BridgeError::NoDevice)));

    engine.set_devices(vec![]);
    assert!(matches!(bridge.attach(1), Err(BridgeError::NoDevice)));
}

#[tokio::test]
async fn device_operations() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let device = bridge.device_manager().unwrap().get_local_device().unwrap();

    let pid = device
        .spawn("/bin/cat", &SpawnOptions::new().argv(["cat", "-u"]).cwd("/tmp"))
        .unwrap();
    assert_eq!(pid, 5000);
    device.resume(pid).unwrap();
    device.kill(pid).unwrap();

    assert_eq!(device.enumerate_processes().unwrap().len(), 2);
    assert_eq!(device.find_process_by_pid(4242).unwrap().name, "target");
    assert_eq!(device.find_process_by_name("init", 0).unwrap().pid, 1);
    let err = device.find_process_by_pid(7).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessNotFound);

    assert_eq!(device.enumerate_applications().unwrap()[0].identifier, "com.example.app");
    assert!(device.frontmost_application().unwrap().is_none());

    device.enable_spawn_gating().unwrap();
    assert_eq!(device.enumerate_pending_spawn().unwrap()[0].pid, 5000);
    device.disable_spawn_gating().unwrap();

    let calls = engine.calls();
    assert!(calls.contains(&"spawn /bin/cat cat -u".to_string()));
    assert!(calls.contains(&"resume 5000".to_string()));
    assert!(calls.contains(&"kill 5000".to_string()));
}

#[tokio::test]
async fn session_toggles_reach_engine() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    let session = bridge.attach(4242).unwrap();

    session.enable_child_gating().unwrap();
    session.disable_child_gating().unwrap();
    session.enable_debugger(5858).unwrap();
    session.disable_debugger().unwrap();
    session.enable_jit().unwrap();
    let script = session
        .create_script_from_bytes("snap", &[0u8; 4], ScriptRuntime::V8)
        .unwrap();
    assert_eq!(script.name(), "snap");

    let calls = engine.calls();
    for expected in [
        "enable_child_gating",
        "disable_child_gating",
        "enable_debugger 5858",
        "disable_debugger",
        "enable_jit",
        "create_script_from_bytes snap",
    ] {
        assert!(calls.iter().any(|c| c == expected), "missing {expected}");
    }
}

#[tokio::test]
async fn shutdown_joins_dispatcher() {
    let engine = FakeEngine::new();
    let bridge = start(&engine);
    bridge.shutdown().await;
    bridge.shutdown().await;
    assert!(bridge.render_metrics().contains("fridabridge_ingest_queue_depth 0"));
}
