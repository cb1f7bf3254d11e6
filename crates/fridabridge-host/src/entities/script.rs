use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use fridabridge_core::error::{check, BridgeError, Result};

use crate::bridge::Bridge;
use crate::engine::{Cancellable, ScriptDescriptor};
use crate::signals::{self, EventKind, Sink};
use crate::types::{Message, RpcValue};

use super::{EntityCore, EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    Created,
    Loaded,
    Unloaded,
}

/// Instrumentation code injected through a session.
///
/// `post` and `call` need the script loaded; once unloaded every operation
/// fails with a released-handle error.
pub struct Script {
    core: EntityCore,
    native_id: u32,
    name: String,
    loaded: AtomicBool,
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("entity", &self.core.id)
            .field("native_id", &self.native_id)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl Script {
    /// Wrap a freshly created script. Its `message` signal is connected
    /// immediately so RPC replies are routed even without a subscriber.
    pub(crate) fn new(bridge: &Bridge, desc: ScriptDescriptor, name: &str) -> Result<Self> {
        let script = Self {
            core: EntityCore::new(bridge, EntityKind::Script, name, desc.handle),
            native_id: desc.id,
            name: name.to_string(),
            loaded: AtomicBool::new(false),
        };
        signals::arm(&script.core, EventKind::Message)?;
        Ok(script)
    }

    pub fn entity_id(&self) -> EntityId {
        self.core.id
    }

    /// Engine-assigned id, unique within the owning session.
    pub fn id(&self) -> u32 {
        self.native_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScriptState {
        if self.core.cell.is_released() {
            ScriptState::Unloaded
        } else if self.loaded.load(Ordering::Acquire) {
            ScriptState::Loaded
        } else {
            ScriptState::Created
        }
    }

    pub fn load(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core.live(|h| {
            check(self.core.engine().load_script(h, &cancel))?;
            self.loaded.store(true, Ordering::Release);
            Ok(())
        })?;
        tracing::debug!(script = %self.name, entity = %self.core.id, "script loaded");
        Ok(())
    }

    /// Unload the script and release its handle. Pending calls fail with a
    /// released-handle error.
    pub fn unload(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .release(|h| check(self.core.engine().unload_script(h, &cancel)))?;
        tracing::debug!(script = %self.name, entity = %self.core.id, "script unloaded");
        Ok(())
    }

    /// Keep the script running in the target after the session goes away.
    pub fn eternalize(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().eternalize_script(h, &cancel)))
    }

    pub fn is_destroyed(&self) -> Result<bool> {
        self.core.live(|h| Ok(self.core.engine().script_is_destroyed(h)))
    }

    /// Send a JSON message, with optional binary data, to the script.
    pub fn post(&self, message: &Value, data: Option<&[u8]>) -> Result<()> {
        let text = serde_json::to_string(message)
            .map_err(|e| BridgeError::BadRequest(format!("message not serializable: {e}")))?;
        self.post_text(&text, data)
    }

    fn post_text(&self, text: &str, data: Option<&[u8]>) -> Result<()> {
        let cancel = Cancellable::new();
        self.core.live(|h| {
            if !self.loaded.load(Ordering::Acquire) {
                return Err(BridgeError::NotLoaded.logged());
            }
            check(self.core.engine().post(h, text, data, &cancel))
        })
    }

    /// Call an exported function with the default deadline.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<RpcValue> {
        let deadline = self.core.bridge.rpc().default_timeout();
        self.call_with_timeout(method, args, deadline).await
    }

    pub async fn call_with_timeout(&self, method: &str, args: &[Value], deadline: Duration) -> Result<RpcValue> {
        match self.state() {
            ScriptState::Loaded => {}
            ScriptState::Created => return Err(BridgeError::NotLoaded.logged()),
            ScriptState::Unloaded => return Err(BridgeError::Released("script").logged()),
        }
        self.core
            .bridge
            .rpc()
            .call(self.core.id, method, args, deadline, |envelope| {
                self.post_text(envelope, None)
            })
            .await
    }

    /// Route `signal` to `sink`, replacing any earlier sink for it.
    pub fn on(&self, signal: &str, sink: Sink) -> Result<()> {
        let kind = signals::parse_signal(&self.core, signal)?;
        signals::subscribe(&self.core, kind, sink)
    }

    pub fn on_message(&self, tx: mpsc::Sender<Message>) -> Result<()> {
        signals::subscribe(&self.core, EventKind::Message, tx.into())
    }

    /// Subscribe with a channel sized from `sinks.default_capacity`.
    pub fn subscribe_messages(&self) -> Result<mpsc::Receiver<Message>> {
        let (tx, rx) = mpsc::channel(self.core.bridge.cfg().sinks.default_capacity);
        self.on_message(tx)?;
        Ok(rx)
    }
}
