//! In-memory engine used by the host integration tests.
//!
//! Records every blocking call, keeps connected trampolines so tests can emit
//! signals from foreign threads, and can answer posted RPC envelopes through a
//! responder closure.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use fridabridge_core::NativeError;
use fridabridge_host::config::BridgeConfig;
use fridabridge_host::engine::{
    Cancellable, DeviceDescriptor, Engine, NativeChild, NativeHandle, NativePayload, NativeResult,
    ScriptDescriptor, Trampoline,
};
use fridabridge_host::types::{Application, DeviceType, Process, ScriptRuntime, Spawn, SpawnOptions};
use fridabridge_host::Bridge;

/// Reply produced by a responder: message text plus optional binary data.
pub type Reply = (String, Option<Bytes>);

type Responder = Arc<dyn Fn(u32, &Value) -> Option<Reply> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Posted {
    pub script: u32,
    pub text: String,
    pub data: Option<Vec<u8>>,
}

#[derive(Default)]
struct State {
    trampolines: Vec<(u64, &'static str, Trampoline)>,
    scripts: HashMap<u32, u64>,
    next_script_id: u32,
    posts: Vec<Posted>,
    unrefs: Vec<u64>,
    calls: Vec<String>,
    processes: Vec<Process>,
    devices: Vec<(String, String, DeviceType)>,
    fail_next: Option<NativeError>,
}

pub struct FakeEngine {
    next_handle: AtomicU64,
    state: Mutex<State>,
    responder: Mutex<Option<Responder>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        let state = State {
            devices: vec![
                ("local".into(), "Local System".into(), DeviceType::Local),
                ("socket".into(), "Local Socket".into(), DeviceType::Remote),
            ],
            processes: vec![
                Process { pid: 1, name: "init".into() },
                Process { pid: 4242, name: "target".into() },
            ],
            ..State::default()
        };
        Arc::new(Self {
            next_handle: AtomicU64::new(100),
            state: Mutex::new(state),
            responder: Mutex::new(None),
        })
    }

    pub fn set_devices(&self, devices: Vec<(&str, &str, DeviceType)>) {
        self.state.lock().unwrap().devices = devices
            .into_iter()
            .map(|(id, name, kind)| (id.to_string(), name.to_string(), kind))
            .collect();
    }

    /// Answer posted RPC envelopes. The closure sees the native script id and
    /// the decoded envelope; its reply is emitted from a separate thread.
    pub fn respond_with<F>(&self, f: F)
    where
        F: Fn(u32, &Value) -> Option<Reply> + Send + Sync + 'static,
    {
        *self.responder.lock().unwrap() = Some(Arc::new(f));
    }

    /// Make the next fallible call fail with `err`.
    pub fn fail_next(&self, err: NativeError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub fn posts(&self) -> Vec<Posted> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn unref_count(&self) -> usize {
        self.state.lock().unwrap().unrefs.len()
    }

    pub fn connect_count(&self, signal: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .trampolines
            .iter()
            .filter(|(_, s, _)| *s == signal)
            .count()
    }

    /// Emit a message from the script with native id `script`, as the engine would.
    pub fn emit_message(&self, script: u32, text: &str, data: Option<Bytes>) {
        let tramps = self.trampolines_for_script(script);
        for t in tramps {
            t.fire(NativePayload::Message {
                text: text.to_string(),
                data: data.clone(),
            });
        }
    }

    /// Emit `signal` on every object that has it connected.
    pub fn emit(&self, signal: &str, payload: NativePayload) {
        let tramps: Vec<Trampoline> = self
            .state
            .lock()
            .unwrap()
            .trampolines
            .iter()
            .filter(|(_, s, _)| *s == signal)
            .map(|(_, _, t)| t.clone())
            .collect();
        for t in tramps {
            t.fire(payload.clone());
        }
    }

    fn trampolines_for_script(&self, script: u32) -> Vec<Trampoline> {
        let st = self.state.lock().unwrap();
        let Some(handle) = st.scripts.get(&script).copied() else {
            return Vec::new();
        };
        st.trampolines
            .iter()
            .filter(|(h, s, _)| *h == handle && *s == "message")
            .map(|(_, _, t)| t.clone())
            .collect()
    }

    fn handle(&self) -> NativeHandle {
        NativeHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, call: impl Into<String>) -> NativeResult<()> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(call.into());
        match st.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn new_script(&self, call: &str) -> NativeResult<ScriptDescriptor> {
        self.record(call)?;
        let handle = self.handle();
        let mut st = self.state.lock().unwrap();
        st.next_script_id += 1;
        let id = st.next_script_id;
        st.scripts.insert(id, handle.0);
        Ok(ScriptDescriptor { handle, id })
    }
}

impl Engine for FakeEngine {
    fn device_manager_new(&self) -> NativeResult<NativeHandle> {
        self.record("device_manager_new")?;
        Ok(self.handle())
    }

    fn device_manager_close(&self, _manager: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("device_manager_close")
    }

    fn enumerate_devices(&self, _manager: NativeHandle, _cancel: &Cancellable) -> NativeResult<Vec<DeviceDescriptor>> {
        self.record("enumerate_devices")?;
        let devices = self.state.lock().unwrap().devices.clone();
        Ok(devices
            .into_iter()
            .map(|(id, name, kind)| DeviceDescriptor {
                handle: self.handle(),
                id,
                name,
                kind,
            })
            .collect())
    }

    fn device_is_lost(&self, _device: NativeHandle) -> bool {
        false
    }

    fn attach(&self, _device: NativeHandle, pid: u32, _cancel: &Cancellable) -> NativeResult<NativeHandle> {
        self.record(format!("attach {pid}"))?;
        Ok(self.handle())
    }

    fn spawn(
        &self,
        _device: NativeHandle,
        program: &str,
        options: &SpawnOptions,
        _cancel: &Cancellable,
    ) -> NativeResult<u32> {
        self.record(format!("spawn {program} {}", options.argv.join(" ")))?;
        Ok(5000)
    }

    fn resume(&self, _device: NativeHandle, pid: u32, _cancel: &Cancellable) -> NativeResult<()> {
        self.record(format!("resume {pid}"))
    }

    fn kill(&self, _device: NativeHandle, pid: u32, _cancel: &Cancellable) -> NativeResult<()> {
        self.record(format!("kill {pid}"))
    }

    fn enumerate_processes(&self, _device: NativeHandle, _cancel: &Cancellable) -> NativeResult<Vec<Process>> {
        self.record("enumerate_processes")?;
        Ok(self.state.lock().unwrap().processes.clone())
    }

    fn find_process_by_pid(
        &self,
        _device: NativeHandle,
        pid: u32,
        _cancel: &Cancellable,
    ) -> NativeResult<Option<Process>> {
        self.record(format!("find_process_by_pid {pid}"))?;
        let st = self.state.lock().unwrap();
        Ok(st.processes.iter().find(|p| p.pid == pid).cloned())
    }

    fn find_process_by_name(
        &self,
        _device: NativeHandle,
        name: &str,
        _timeout_ms: i32,
        _cancel: &Cancellable,
    ) -> NativeResult<Option<Process>> {
        self.record(format!("find_process_by_name {name}"))?;
        let st = self.state.lock().unwrap();
        Ok(st.processes.iter().find(|p| p.name == name).cloned())
    }

    fn enumerate_applications(&self, _device: NativeHandle, _cancel: &Cancellable) -> NativeResult<Vec<Application>> {
        self.record("enumerate_applications")?;
        Ok(vec![Application {
            identifier: "com.example.app".into(),
            name: "Example".into(),
            pid: 0,
        }])
    }

    fn frontmost_application(
        &self,
        _device: NativeHandle,
        _cancel: &Cancellable,
    ) -> NativeResult<Option<Application>> {
        self.record("frontmost_application")?;
        Ok(None)
    }

    fn enable_spawn_gating(&self, _device: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("enable_spawn_gating")
    }

    fn disable_spawn_gating(&self, _device: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("disable_spawn_gating")
    }

    fn enumerate_pending_spawn(&self, _device: NativeHandle, _cancel: &Cancellable) -> NativeResult<Vec<Spawn>> {
        self.record("enumerate_pending_spawn")?;
        Ok(vec![Spawn {
            identifier: "com.example.app".into(),
            pid: 5000,
        }])
    }

    fn enumerate_pending_children(
        &self,
        _device: NativeHandle,
        _cancel: &Cancellable,
    ) -> NativeResult<Vec<NativeChild>> {
        self.record("enumerate_pending_children")?;
        Ok(vec![NativeChild {
            pid: 5001,
            parent_pid: 5000,
            origin: 0,
            identifier: None,
            path: None,
            argv: Vec::new(),
            envp: Vec::new(),
        }])
    }

    fn detach(&self, _session: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("detach")
    }

    fn enable_child_gating(&self, _session: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("enable_child_gating")
    }

    fn disable_child_gating(&self, _session: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("disable_child_gating")
    }

    fn enable_debugger(&self, _session: NativeHandle, port: u16, _cancel: &Cancellable) -> NativeResult<()> {
        self.record(format!("enable_debugger {port}"))
    }

    fn disable_debugger(&self, _session: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("disable_debugger")
    }

    fn enable_jit(&self, _session: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("enable_jit")
    }

    fn create_script(
        &self,
        _session: NativeHandle,
        name: &str,
        _source: &str,
        _runtime: ScriptRuntime,
        _cancel: &Cancellable,
    ) -> NativeResult<ScriptDescriptor> {
        self.new_script(&format!("create_script {name}"))
    }

    fn create_script_from_bytes(
        &self,
        _session: NativeHandle,
        name: &str,
        _bytes: &[u8],
        _runtime: ScriptRuntime,
        _cancel: &Cancellable,
    ) -> NativeResult<ScriptDescriptor> {
        self.new_script(&format!("create_script_from_bytes {name}"))
    }

    fn load_script(&self, _script: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("load_script")
    }

    fn unload_script(&self, _script: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("unload_script")
    }

    fn eternalize_script(&self, _script: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("eternalize_script")
    }

    fn script_is_destroyed(&self, _script: NativeHandle) -> bool {
        false
    }

    fn post(
        &self,
        script: NativeHandle,
        message: &str,
        data: Option<&[u8]>,
        _cancel: &Cancellable,
    ) -> NativeResult<()> {
        self.record("post")?;
        let native_id = {
            let mut st = self.state.lock().unwrap();
            let native_id = st
                .scripts
                .iter()
                .find(|(_, h)| **h == script.0)
                .map(|(id, _)| *id)
                .unwrap_or(0);
            st.posts.push(Posted {
                script: native_id,
                text: message.to_string(),
                data: data.map(|d| d.to_vec()),
            });
            native_id
        };

        let responder = self.responder.lock().unwrap().clone();
        let Some(responder) = responder else {
            return Ok(());
        };
        let envelope: Value = serde_json::from_str(message).unwrap_or(Value::Null);
        if let Some((text, data)) = responder(native_id, &envelope) {
            let tramps = self.trampolines_for_script(native_id);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                for t in tramps {
                    t.fire(NativePayload::Message {
                        text: text.clone(),
                        data: data.clone(),
                    });
                }
            });
        }
        Ok(())
    }

    fn file_monitor_new(&self, path: &str) -> NativeResult<NativeHandle> {
        self.record(format!("file_monitor_new {path}"))?;
        Ok(self.handle())
    }

    fn file_monitor_enable(&self, _monitor: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("file_monitor_enable")
    }

    fn file_monitor_disable(&self, _monitor: NativeHandle, _cancel: &Cancellable) -> NativeResult<()> {
        self.record("file_monitor_disable")
    }

    fn connect_signal(&self, target: NativeHandle, signal: &'static str, trampoline: Trampoline) -> NativeResult<()> {
        self.record(format!("connect {signal}"))?;
        self.state
            .lock()
            .unwrap()
            .trampolines
            .push((target.0, signal, trampoline));
        Ok(())
    }

    fn unref(&self, handle: NativeHandle) {
        self.state.lock().unwrap().unrefs.push(handle.0);
    }
}

/// Reply text for an RPC envelope: `["frida:rpc", id, outcome, results...]`.
pub fn rpc_reply(request_id: &Value, outcome: &str, results: &[Value]) -> String {
    let mut payload = vec![Value::from("frida:rpc"), request_id.clone(), Value::from(outcome)];
    payload.extend_from_slice(results);
    serde_json::json!({ "type": "send", "payload": payload }).to_string()
}

pub fn start(engine: &Arc<FakeEngine>) -> Bridge {
    start_with(engine, BridgeConfig::default())
}

pub fn start_with(engine: &Arc<FakeEngine>, cfg: BridgeConfig) -> Bridge {
    let engine: Arc<dyn Engine> = engine.clone();
    Bridge::start(engine, cfg).unwrap()
}

/// Wait until `cond` holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
