use dashmap::DashMap;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::signals::EventKind;

/// Host-assigned identity of a wrapped native object, unique per bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    DeviceManager,
    Device,
    Session,
    Script,
    FileMonitor,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::DeviceManager => "device manager",
            EntityKind::Device => "device",
            EntityKind::Session => "session",
            EntityKind::Script => "script",
            EntityKind::FileMonitor => "file monitor",
        }
    }

    /// Signals this kind of entity emits.
    pub fn supports(self, kind: EventKind) -> bool {
        matches!(
            (self, kind),
            (EntityKind::Script, EventKind::Message)
                | (EntityKind::Device, EventKind::ChildAdded)
                | (EntityKind::Device, EventKind::SpawnAdded)
                | (EntityKind::Device, EventKind::Output)
                | (EntityKind::FileMonitor, EventKind::FileChange)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub name: String,
}

/// Inventory of live entities:
/// - issues `EntityId`s
/// - `EntityId -> (kind, name)` until the entity is released or dropped
pub struct HandleRegistry {
    live: DashMap<EntityId, EntityRecord>,
    seq: AtomicU64,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            live: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn register(&self, kind: EntityKind, name: impl Into<String>) -> EntityId {
        let id = EntityId(self.seq.fetch_add(1, Ordering::Relaxed));
        self.live.insert(
            id,
            EntityRecord {
                kind,
                name: name.into(),
            },
        );
        id
    }

    pub fn forget(&self, id: EntityId) -> Option<EntityRecord> {
        self.live.remove(&id).map(|(_, rec)| rec)
    }

    pub fn get(&self, id: EntityId) -> Option<EntityRecord> {
        self.live.get(&id).map(|r| r.value().clone())
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    /// Snapshot sorted by id.
    pub fn live_entities(&self) -> Vec<(EntityId, EntityRecord)> {
        let mut out: Vec<_> = self
            .live
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
