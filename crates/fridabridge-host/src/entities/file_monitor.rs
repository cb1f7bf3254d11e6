use tokio::sync::mpsc;

use fridabridge_core::error::{check, Result};

use crate::bridge::Bridge;
use crate::engine::Cancellable;
use crate::signals::{self, EventKind};
use crate::types::FileMonitorEvent;

use super::{EntityCore, EntityId, EntityKind};

/// Watches one path on the target's filesystem.
pub struct FileMonitor {
    core: EntityCore,
    path: String,
}

impl FileMonitor {
    pub(crate) fn open(bridge: &Bridge, path: &str) -> Result<Self> {
        let handle = check(bridge.engine().file_monitor_new(path))?;
        Ok(Self {
            core: EntityCore::new(bridge, EntityKind::FileMonitor, path, handle),
            path: path.to_string(),
        })
    }

    pub fn entity_id(&self) -> EntityId {
        self.core.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn enable(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().file_monitor_enable(h, &cancel)))
    }

    pub fn disable(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .live(|h| check(self.core.engine().file_monitor_disable(h, &cancel)))
    }

    pub fn on_change(&self, tx: mpsc::Sender<FileMonitorEvent>) -> Result<()> {
        signals::subscribe(&self.core, EventKind::FileChange, tx.into())
    }
}
