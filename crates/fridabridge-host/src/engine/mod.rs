//! Seam to the native instrumentation engine.
//!
//! The engine exposes blocking operations on opaque handles and a signal
//! mechanism that invokes a [`Trampoline`] from one of its own worker threads.
//! Implementations wrap the real native library; tests use an in-memory fake.
//!
//! Every blocking call receives a fresh [`Cancellable`] created by the host.
//! Triggering it asks the engine to abort that one call; nothing propagates
//! across calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use fridabridge_core::NativeError;

pub use crate::ingest::Trampoline;
use crate::types::{Application, DeviceType, Process, ScriptRuntime, Spawn, SpawnOptions};

/// Result of a blocking native call.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Opaque native object reference (device, session, script, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Per-call cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Cancellable {
    cancelled: Arc<AtomicBool>,
}

impl Cancellable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Device as listed by the device manager.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub handle: NativeHandle,
    pub id: String,
    pub name: String,
    pub kind: DeviceType,
}

/// Script as returned by `create_script`.
#[derive(Debug, Clone, Copy)]
pub struct ScriptDescriptor {
    pub handle: NativeHandle,
    pub id: u32,
}

/// Child record in the engine's own encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeChild {
    pub pid: u32,
    pub parent_pid: u32,
    /// 0 = fork, 1 = exec, 2 = spawn.
    pub origin: u32,
    pub identifier: Option<String>,
    pub path: Option<String>,
    pub argv: Vec<String>,
    pub envp: Vec<String>,
}

/// Arguments of one signal emission, still in native form.
#[derive(Debug, Clone)]
pub enum NativePayload {
    Message {
        text: String,
        data: Option<Bytes>,
    },
    ChildAdded(NativeChild),
    SpawnAdded(Spawn),
    Output {
        pid: u32,
        fd: i32,
        data: Option<Bytes>,
    },
    FileChange {
        path: String,
        other_path: Option<String>,
        /// GFileMonitorEvent code.
        event_type: u32,
    },
}

/// Blocking operations and signal registration offered by the native engine.
pub trait Engine: Send + Sync + 'static {
    fn device_manager_new(&self) -> NativeResult<NativeHandle>;
    fn device_manager_close(&self, manager: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn enumerate_devices(
        &self,
        manager: NativeHandle,
        cancel: &Cancellable,
    ) -> NativeResult<Vec<DeviceDescriptor>>;

    fn device_is_lost(&self, device: NativeHandle) -> bool;
    fn attach(&self, device: NativeHandle, pid: u32, cancel: &Cancellable) -> NativeResult<NativeHandle>;
    fn spawn(
        &self,
        device: NativeHandle,
        program: &str,
        options: &SpawnOptions,
        cancel: &Cancellable,
    ) -> NativeResult<u32>;
    fn resume(&self, device: NativeHandle, pid: u32, cancel: &Cancellable) -> NativeResult<()>;
    fn kill(&self, device: NativeHandle, pid: u32, cancel: &Cancellable) -> NativeResult<()>;
    fn enumerate_processes(&self, device: NativeHandle, cancel: &Cancellable) -> NativeResult<Vec<Process>>;
    fn find_process_by_pid(
        &self,
        device: NativeHandle,
        pid: u32,
        cancel: &Cancellable,
    ) -> NativeResult<Option<Process>>;
    fn find_process_by_name(
        &self,
        device: NativeHandle,
        name: &str,
        timeout_ms: i32,
        cancel: &Cancellable,
    ) -> NativeResult<Option<Process>>;
    fn enumerate_applications(
        &self,
        device: NativeHandle,
        cancel: &Cancellable,
    ) -> NativeResult<Vec<Application>>;
    fn frontmost_application(
        &self,
        device: NativeHandle,
        cancel: &Cancellable,
    ) -> NativeResult<Option<Application>>;
    fn enable_spawn_gating(&self, device: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn disable_spawn_gating(&self, device: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn enumerate_pending_spawn(&self, device: NativeHandle, cancel: &Cancellable) -> NativeResult<Vec<Spawn>>;
    fn enumerate_pending_children(
        &self,
        device: NativeHandle,
        cancel: &Cancellable,
    ) -> NativeResult<Vec<NativeChild>>;

    fn detach(&self, session: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn enable_child_gating(&self, session: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn disable_child_gating(&self, session: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn enable_debugger(&self, session: NativeHandle, port: u16, cancel: &Cancellable) -> NativeResult<()>;
    fn disable_debugger(&self, session: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn enable_jit(&self, session: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn create_script(
        &self,
        session: NativeHandle,
        name: &str,
        source: &str,
        runtime: ScriptRuntime,
        cancel: &Cancellable,
    ) -> NativeResult<ScriptDescriptor>;
    fn create_script_from_bytes(
        &self,
        session: NativeHandle,
        name: &str,
        bytes: &[u8],
        runtime: ScriptRuntime,
        cancel: &Cancellable,
    ) -> NativeResult<ScriptDescriptor>;

    fn load_script(&self, script: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn unload_script(&self, script: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn eternalize_script(&self, script: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn script_is_destroyed(&self, script: NativeHandle) -> bool;
    fn post(
        &self,
        script: NativeHandle,
        message: &str,
        data: Option<&[u8]>,
        cancel: &Cancellable,
    ) -> NativeResult<()>;

    fn file_monitor_new(&self, path: &str) -> NativeResult<NativeHandle>;
    fn file_monitor_enable(&self, monitor: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;
    fn file_monitor_disable(&self, monitor: NativeHandle, cancel: &Cancellable) -> NativeResult<()>;

    /// Connect `signal` on `target`; the engine calls `trampoline.fire` on every emission.
    fn connect_signal(
        &self,
        target: NativeHandle,
        signal: &'static str,
        trampoline: Trampoline,
    ) -> NativeResult<()>;

    /// Drop the host's reference to a native object.
    fn unref(&self, handle: NativeHandle);
}
