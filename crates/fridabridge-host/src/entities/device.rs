use tokio::sync::mpsc;

use fridabridge_core::error::{check, BridgeError, ErrorKind, Result};

use crate::bridge::Bridge;
use crate::dispatch::decode;
use crate::engine::{Cancellable, DeviceDescriptor};
use crate::signals::{self, EventKind, Sink};
use crate::types::{Application, Child, DeviceType, Output, Process, Spawn, SpawnOptions};

use super::{EntityCore, EntityId, EntityKind, Session};

/// A local, USB, or remote device known to the engine.
pub struct Device {
    core: EntityCore,
    id: String,
    name: String,
    kind: DeviceType,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn process_not_found(what: String) -> BridgeError {
    BridgeError::Native {
        kind: ErrorKind::ProcessNotFound,
        code: 3,
        message: what,
    }
    .logged()
}

impl Device {
    pub(crate) fn new(bridge: &Bridge, desc: DeviceDescriptor) -> Self {
        Self {
            core: EntityCore::new(bridge, EntityKind::Device, &desc.name, desc.handle),
            id: desc.id,
            name: desc.name,
            kind: desc.kind,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.core.id
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceType {
        self.kind
    }

    pub fn is_lost(&self) -> Result<bool> {
        self.core.live(|h| Ok(self.core.engine().device_is_lost(h)))
    }

    pub fn attach(&self, pid: u32) -> Result<Session> {
        self.attach_cancellable(pid, &Cancellable::new())
    }

    pub fn attach_cancellable(&self, pid: u32, cancel: &Cancellable) -> Result<Session> {
        let handle = self
            .core
            .live(|h| check(self.core.engine().attach(h, pid, cancel)))?;
        tracing::debug!(device = %self.id, pid, "attached");
        Ok(Session::new(&self.core.bridge, handle, pid))
    }

    /// Launch `program` suspended and return its pid.
    pub fn spawn(&self, program: &str, options: &SpawnOptions) -> Result<u32> {
        self.spawn_cancellable(program, options, &Cancellable::new())
    }

    pub fn spawn_cancellable(&self, program: &str, options: &SpawnOptions, cancel: &Cancellable) -> Result<u32> {
        let pid = self
            .core
            .live(|h| check(self.core.engine().spawn(h, program, options, cancel)))?;
        tracing::debug!(device = %self.id, program, pid, "spawned");
        Ok(pid)
    }

    pub fn resume(&self, pid: u32) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().resume(h, pid, &cancel)))
    }

    pub fn kill(&self, pid: u32) -> Result<()> {
        let cancel = Cancellable::new();
        self.core.live(|h| check(self.core.engine().kill(h, pid, &cancel)))
    }

    pub fn enumerate_processes(&self) -> Result<Vec<Process>> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enumerate_processes(h, &cancel)))
    }

    pub fn find_process_by_pid(&self, pid: u32) -> Result<Process> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().find_process_by_pid(h, pid, &cancel)))?
            .ok_or_else(|| process_not_found(format!("process with pid {pid} not found")))
    }

    /// Look a process up by name, waiting up to `timeout_ms` for it to appear
    /// (negative waits indefinitely, zero does not wait).
    pub fn find_process_by_name(&self, name: &str, timeout_ms: i32) -> Result<Process> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().find_process_by_name(h, name, timeout_ms, &cancel)))?
            .ok_or_else(|| process_not_found(format!("process with name '{name}' not found")))
    }

    pub fn enumerate_applications(&self) -> Result<Vec<Application>> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enumerate_applications(h, &cancel)))
    }

    /// `None` when no application is in the foreground.
    pub fn frontmost_application(&self) -> Result<Option<Application>> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().frontmost_application(h, &cancel)))
    }

    pub fn enable_spawn_gating(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enable_spawn_gating(h, &cancel)))
    }

    pub fn disable_spawn_gating(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().disable_spawn_gating(h, &cancel)))
    }

    pub fn enumerate_pending_spawn(&self) -> Result<Vec<Spawn>> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enumerate_pending_spawn(h, &cancel)))
    }

    pub fn enumerate_pending_children(&self) -> Result<Vec<Child>> {
        let cancel = Cancellable::new();
        let children = self
            .core
            .live(|h| check(self.core.engine().enumerate_pending_children(h, &cancel)))?;
        Ok(children.into_iter().map(decode::child).collect())
    }

    /// Route `signal` to `sink`, replacing any earlier sink for it.
    pub fn on(&self, signal: &str, sink: Sink) -> Result<()> {
        let kind = signals::parse_signal(&self.core, signal)?;
        signals::subscribe(&self.core, kind, sink)
    }

    pub fn on_child_added(&self, tx: mpsc::Sender<Child>) -> Result<()> {
        signals::subscribe(&self.core, EventKind::ChildAdded, tx.into())
    }

    pub fn on_spawn_added(&self, tx: mpsc::Sender<Spawn>) -> Result<()> {
        signals::subscribe(&self.core, EventKind::SpawnAdded, tx.into())
    }

    pub fn on_output(&self, tx: mpsc::Sender<Output>) -> Result<()> {
        signals::subscribe(&self.core, EventKind::Output, tx.into())
    }
}
