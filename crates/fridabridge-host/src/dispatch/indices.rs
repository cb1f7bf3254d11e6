use dashmap::DashMap;

use crate::entities::{EntityId, HandleRegistry};

/// Per-entity counters for plain script messages.
///
/// Shared between the dispatcher, which advances them, and the bridge, which
/// drops an entity's counter when the entity is forgotten.
#[derive(Debug, Default)]
pub struct MessageIndices {
    next: DashMap<EntityId, u64>,
}

impl MessageIndices {
    pub fn new() -> Self {
        Self {
            next: DashMap::new(),
        }
    }

    /// Next index for `entity`, or `None` once the entity has left the registry.
    pub fn advance(&self, entity: EntityId, registry: &HandleRegistry) -> Option<u64> {
        if !registry.is_live(entity) {
            return None;
        }
        let index = {
            let mut slot = self.next.entry(entity).or_insert(0);
            let index = *slot;
            *slot += 1;
            index
        };
        // Registry removal precedes `forget`, so a release that raced the
        // insert above is visible here.
        if !registry.is_live(entity) {
            self.next.remove(&entity);
            return None;
        }
        Some(index)
    }

    pub fn forget(&self, entity: EntityId) {
        self.next.remove(&entity);
    }

    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}
