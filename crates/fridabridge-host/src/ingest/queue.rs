use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::engine::NativePayload;
use crate::entities::EntityId;
use crate::signals::EventKind;

/// One native callback firing. Built only by a trampoline, consumed once by the dispatcher.
#[derive(Debug)]
pub struct RawEvent {
    pub emitter: EntityId,
    pub kind: EventKind,
    pub payload: NativePayload,
    pub user_data: usize,
}

/// Bounded multi-producer / single-consumer FIFO between engine threads and the dispatcher.
///
/// `push` never waits on the consumer: when full, the oldest entry is evicted.
pub struct IngestQueue {
    events: Mutex<VecDeque<RawEvent>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
    evicted: AtomicU64,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            evicted: AtomicU64::new(0),
        }
    }

    /// Enqueue from any thread. Returns false if the event was refused or evicted another one.
    pub fn push(&self, ev: RawEvent) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        // Poisoned lock means a consumer bug; refuse instead of panicking on an engine thread.
        let Ok(mut q) = self.events.lock() else {
            return false;
        };
        let mut accepted = true;
        if q.len() >= self.capacity {
            q.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
            accepted = false;
        }
        q.push_back(ev);
        drop(q);

        self.notify.notify_one();
        accepted
    }

    pub fn try_pop(&self) -> Option<RawEvent> {
        self.events.lock().ok()?.pop_front()
    }

    /// Wait for the next event. Returns `None` once closed and drained.
    pub async fn recv(&self) -> Option<RawEvent> {
        loop {
            if let Some(ev) = self.try_pop() {
                return Some(ev);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Evictions since the last call.
    pub fn take_evicted(&self) -> u64 {
        self.evicted.swap(0, Ordering::Relaxed)
    }
}
