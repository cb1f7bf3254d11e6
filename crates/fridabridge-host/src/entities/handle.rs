//! Guarded ownership of native handles.
//!
//! Every operation runs inside [`HandleCell::with_live`], which holds a read
//! lock on the released flag for the duration of the native call. Release
//! takes the write lock, so a handle can never be released underneath a call
//! in flight, and once released it is never passed to the engine again.

use std::sync::{Arc, RwLock};

use dashmap::DashSet;

use fridabridge_core::error::{BridgeError, Result};

use crate::bridge::Bridge;
use crate::engine::{Engine, NativeHandle};
use crate::signals::EventKind;

use super::registry::{EntityId, EntityKind};

pub(crate) struct HandleCell {
    engine: Arc<dyn Engine>,
    handle: NativeHandle,
    entity: &'static str,
    released: RwLock<bool>,
}

impl HandleCell {
    pub(crate) fn new(engine: Arc<dyn Engine>, handle: NativeHandle, entity: &'static str) -> Self {
        Self {
            engine,
            handle,
            entity,
            released: RwLock::new(false),
        }
    }

    pub(crate) fn with_live<T>(&self, f: impl FnOnce(NativeHandle) -> Result<T>) -> Result<T> {
        let guard = self
            .released
            .read()
            .map_err(|_| BridgeError::Internal(format!("{} handle lock poisoned", self.entity)))?;
        if *guard {
            return Err(BridgeError::Released(self.entity).logged());
        }
        f(self.handle)
    }

    /// Run the native release step once. On error the handle stays live.
    pub(crate) fn release_with(&self, f: impl FnOnce(NativeHandle) -> Result<()>) -> Result<()> {
        let mut guard = self
            .released
            .write()
            .map_err(|_| BridgeError::Internal(format!("{} handle lock poisoned", self.entity)))?;
        if *guard {
            return Err(BridgeError::Released(self.entity).logged());
        }
        f(self.handle)?;
        self.engine.unref(self.handle);
        *guard = true;
        Ok(())
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.read().map(|g| *g).unwrap_or(true)
    }
}

impl Drop for HandleCell {
    fn drop(&mut self) {
        let released = match self.released.get_mut() {
            Ok(r) => *r,
            Err(poisoned) => *poisoned.into_inner(),
        };
        if !released {
            self.engine.unref(self.handle);
        }
    }
}

/// State shared by every entity wrapper: identity, guarded handle, armed signals.
pub(crate) struct EntityCore {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) cell: HandleCell,
    pub(crate) bridge: Bridge,
    pub(crate) armed: DashSet<EventKind>,
}

impl EntityCore {
    pub(crate) fn new(bridge: &Bridge, kind: EntityKind, name: &str, handle: NativeHandle) -> Self {
        let id = bridge.registry().register(kind, name);
        Self {
            id,
            kind,
            cell: HandleCell::new(Arc::clone(bridge.engine()), handle, kind.as_str()),
            bridge: bridge.clone(),
            armed: DashSet::new(),
        }
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        self.bridge.engine().as_ref()
    }

    pub(crate) fn live<T>(&self, f: impl FnOnce(NativeHandle) -> Result<T>) -> Result<T> {
        self.cell.with_live(f)
    }

    /// Release the native object and drop every correlation entry this entity owns.
    pub(crate) fn release(&self, f: impl FnOnce(NativeHandle) -> Result<()>) -> Result<()> {
        self.cell.release_with(f)?;
        self.bridge.forget(self.id);
        tracing::debug!(entity = %self.id, kind = self.kind.as_str(), "handle released");
        Ok(())
    }
}

impl Drop for EntityCore {
    fn drop(&mut self) {
        self.bridge.forget(self.id);
    }
}
