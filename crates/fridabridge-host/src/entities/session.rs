use fridabridge_core::error::{check, Result};

use crate::bridge::Bridge;
use crate::engine::{Cancellable, NativeHandle};
use crate::types::ScriptRuntime;

use super::{EntityCore, EntityId, EntityKind, Script};

/// Attachment to one process.
pub struct Session {
    core: EntityCore,
    pid: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("entity", &self.core.id)
            .field("pid", &self.pid)
            .finish()
    }
}

impl Session {
    pub(crate) fn new(bridge: &Bridge, handle: NativeHandle, pid: u32) -> Self {
        Self {
            core: EntityCore::new(bridge, EntityKind::Session, &format!("pid {pid}"), handle),
            pid,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.core.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn create_script(&self, name: &str, source: &str, runtime: ScriptRuntime) -> Result<Script> {
        self.create_script_cancellable(name, source, runtime, &Cancellable::new())
    }

    pub fn create_script_cancellable(
        &self,
        name: &str,
        source: &str,
        runtime: ScriptRuntime,
        cancel: &Cancellable,
    ) -> Result<Script> {
        let desc = self
            .core
            .live(|h| check(self.core.engine().create_script(h, name, source, runtime, cancel)))?;
        tracing::debug!(pid = self.pid, script = name, native_id = desc.id, "script created");
        Script::new(&self.core.bridge, desc, name)
    }

    /// Create a script from a precompiled snapshot.
    pub fn create_script_from_bytes(&self, name: &str, bytes: &[u8], runtime: ScriptRuntime) -> Result<Script> {
        let cancel = Cancellable::new();
        let desc = self.core.live(|h| {
            check(
                self.core
                    .engine()
                    .create_script_from_bytes(h, name, bytes, runtime, &cancel),
            )
        })?;
        tracing::debug!(pid = self.pid, script = name, native_id = desc.id, "script created from bytes");
        Script::new(&self.core.bridge, desc, name)
    }

    /// Detach from the process. A second detach fails with a released-handle error.
    pub fn detach(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core.release(|h| check(self.core.engine().detach(h, &cancel)))?;
        tracing::debug!(pid = self.pid, "detached");
        Ok(())
    }

    pub fn is_detached(&self) -> bool {
        self.core.cell.is_released()
    }

    pub fn enable_child_gating(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enable_child_gating(h, &cancel)))
    }

    pub fn disable_child_gating(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().disable_child_gating(h, &cancel)))
    }

    /// Expose the target's JavaScript debugger on `port` (0 lets the engine pick).
    pub fn enable_debugger(&self, port: u16) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().enable_debugger(h, port, &cancel)))
    }

    pub fn disable_debugger(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().disable_debugger(h, &cancel)))
    }

    pub fn enable_jit(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core.live(|h| check(self.core.engine().enable_jit(h, &cancel)))
    }
}
