use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

use fridabridge_core::error::{BridgeError, Result};

use crate::entities::EntityId;
use crate::rpc::RpcDelivery;
use crate::signals::{EventKind, Sink};

/// Second half of a correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    /// Subscriber slot for one signal (`"message"`, `"child-added"`, ...).
    Sink(EventKind),
    /// In-flight RPC call.
    Request(String),
}

impl std::fmt::Display for Discriminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discriminator::Sink(kind) => f.write_str(kind.as_str()),
            Discriminator::Request(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    pub entity: EntityId,
    pub discriminator: Discriminator,
}

impl CorrelationKey {
    pub fn sink(entity: EntityId, kind: EventKind) -> Self {
        Self {
            entity,
            discriminator: Discriminator::Sink(kind),
        }
    }

    pub fn request(entity: EntityId, request_id: impl Into<String>) -> Self {
        Self {
            entity,
            discriminator: Discriminator::Request(request_id.into()),
        }
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.entity, self.discriminator)
    }
}

/// Where a correlated delivery goes.
#[derive(Debug)]
pub enum Target {
    /// Long-lived subscriber; stays registered across deliveries.
    Sink(Sink),
    /// Single-slot waiter of one RPC call; removed on resolution.
    Waiter(oneshot::Sender<RpcDelivery>),
}

/// Concurrent `CorrelationKey -> Target` map.
///
/// Producers: the RPC gateway (waiters) and the signal facade (sinks).
/// Consumer: the dispatcher. No operation blocks beyond a shard lock.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: DashMap<CorrelationKey, Target>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert a new entry; a live entry under the same key is left untouched and reported.
    pub fn register(&self, key: CorrelationKey, target: Target) -> Result<()> {
        match self.entries.entry(key) {
            Entry::Occupied(o) => Err(BridgeError::DuplicateKey(o.key().to_string())),
            Entry::Vacant(v) => {
                v.insert(target);
                Ok(())
            }
        }
    }

    /// Insert or overwrite, returning the previous target.
    pub fn replace(&self, key: CorrelationKey, target: Target) -> Option<Target> {
        self.entries.insert(key, target)
    }

    /// Atomically look up and remove.
    pub fn resolve(&self, key: &CorrelationKey) -> Option<Target> {
        self.entries.remove(key).map(|(_, t)| t)
    }

    pub fn unregister(&self, key: &CorrelationKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Clone of the sink registered under `key`, leaving it in place.
    pub fn sink(&self, key: &CorrelationKey) -> Option<Sink> {
        match self.entries.get(key)?.value() {
            Target::Sink(s) => Some(s.clone()),
            Target::Waiter(_) => None,
        }
    }

    /// Remove the sink under `key` only if its receiver is gone.
    pub fn remove_closed_sink(&self, key: &CorrelationKey) -> bool {
        self.entries
            .remove_if(key, |_, t| matches!(t, Target::Sink(s) if s.is_closed()))
            .is_some()
    }

    /// Drop every entry owned by `entity`. Pending waiters see their slot closed.
    pub fn purge_entity(&self, entity: EntityId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.entity != entity);
        before.saturating_sub(self.entries.len())
    }

    pub fn contains(&self, key: &CorrelationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn waiter() -> (Target, oneshot::Receiver<RpcDelivery>) {
        let (tx, rx) = oneshot::channel();
        (Target::Waiter(tx), rx)
    }

    #[test]
    fn duplicate_request_key_is_rejected() {
        let table = CorrelationTable::new();
        let key = CorrelationKey::request(EntityId::from_raw(1), "req_1");
        let (a, _rx_a) = waiter();
        let (b, _rx_b) = waiter();
        assert!(table.register(key.clone(), a).is_ok());
        let err = table.register(key.clone(), b).unwrap_err();
        assert_eq!(err.to_string(), "correlation key already registered: 1_req_1");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn resolve_removes_exactly_once() {
        let table = CorrelationTable::new();
        let key = CorrelationKey::request(EntityId::from_raw(2), "req_5");
        let (t, _rx) = waiter();
        table.register(key.clone(), t).unwrap();
        assert!(matches!(table.resolve(&key), Some(Target::Waiter(_))));
        assert!(table.resolve(&key).is_none());
        assert!(!table.unregister(&key));
    }

    #[test]
    fn same_request_id_on_different_entities_does_not_collide() {
        let table = CorrelationTable::new();
        let (a, _ra) = waiter();
        let (b, _rb) = waiter();
        table
            .register(CorrelationKey::request(EntityId::from_raw(1), "req_1"), a)
            .unwrap();
        table
            .register(CorrelationKey::request(EntityId::from_raw(2), "req_1"), b)
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn sink_lookup_leaves_entry_and_closed_sinks_are_pruned() {
        let table = CorrelationTable::new();
        let key = CorrelationKey::sink(EntityId::from_raw(3), EventKind::Message);
        let (tx, rx) = mpsc::channel(1);
        table.replace(key.clone(), Target::Sink(Sink::Message(tx)));

        assert!(table.sink(&key).is_some());
        assert!(!table.remove_closed_sink(&key));
        drop(rx);
        assert!(table.remove_closed_sink(&key));
        assert!(table.sink(&key).is_none());
    }

    #[test]
    fn purge_only_touches_one_entity() {
        let table = CorrelationTable::new();
        let e1 = EntityId::from_raw(10);
        let e2 = EntityId::from_raw(11);
        let (a, mut ra) = waiter();
        let (b, _rb) = waiter();
        table.register(CorrelationKey::request(e1, "req_1"), a).unwrap();
        table.register(CorrelationKey::request(e2, "req_2"), b).unwrap();

        assert_eq!(table.purge_entity(e1), 1);
        assert_eq!(table.len(), 1);
        assert!(ra.try_recv().is_err());
    }
}
