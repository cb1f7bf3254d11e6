use std::sync::Arc;

use crate::engine::NativePayload;
use crate::entities::EntityId;
use crate::signals::EventKind;

use super::{IngestQueue, RawEvent};

/// Callback target handed to the engine when a signal is connected.
///
/// `fire` may run on any engine thread. It only wraps the payload and enqueues
/// it; it never blocks on the dispatcher.
#[derive(Clone)]
pub struct Trampoline {
    queue: Arc<IngestQueue>,
    emitter: EntityId,
    kind: EventKind,
}

impl Trampoline {
    pub(crate) fn new(queue: Arc<IngestQueue>, emitter: EntityId, kind: EventKind) -> Self {
        Self {
            queue,
            emitter,
            kind,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn emitter(&self) -> EntityId {
        self.emitter
    }

    pub fn fire(&self, payload: NativePayload) -> bool {
        self.fire_with(payload, 0)
    }

    /// Like `fire`, forwarding the engine's opaque user-data token.
    pub fn fire_with(&self, payload: NativePayload, user_data: usize) -> bool {
        self.queue.push(RawEvent {
            emitter: self.emitter,
            kind: self.kind,
            payload,
            user_data,
        })
    }
}

impl std::fmt::Debug for Trampoline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trampoline")
            .field("emitter", &self.emitter)
            .field("kind", &self.kind)
            .finish()
    }
}
