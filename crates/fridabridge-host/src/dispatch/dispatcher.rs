use std::sync::Arc;

use bytes::Bytes;

use fridabridge_core::protocol::{decode_script_message, LogLevel, RpcReply, ScriptEnvelope};

use crate::correlation::{CorrelationKey, CorrelationTable, Target};
use crate::engine::NativePayload;
use crate::entities::{EntityId, HandleRegistry};
use crate::ingest::{IngestQueue, RawEvent};
use crate::obs::metrics::BridgeMetrics;
use crate::rpc::RpcDelivery;
use crate::signals::{Delivery, EventKind, Record};
use crate::types::Message;

use super::decode;
use super::indices::MessageIndices;

/// Single consumer of the ingestion queue.
///
/// Owns decoding and routing. Message counters are shared with the bridge,
/// which clears them when an entity is forgotten.
pub struct Dispatcher {
    queue: Arc<IngestQueue>,
    table: Arc<CorrelationTable>,
    metrics: Arc<BridgeMetrics>,
    registry: Arc<HandleRegistry>,
    indices: Arc<MessageIndices>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<IngestQueue>,
        table: Arc<CorrelationTable>,
        metrics: Arc<BridgeMetrics>,
        registry: Arc<HandleRegistry>,
        indices: Arc<MessageIndices>,
    ) -> Self {
        Self {
            queue,
            table,
            metrics,
            registry,
            indices,
        }
    }

    /// Drain the queue until it is closed.
    pub async fn run(mut self) {
        tracing::debug!(capacity = self.queue.capacity(), "dispatcher started");
        while let Some(ev) = self.queue.recv().await {
            self.note_evictions();
            self.dispatch(ev);
        }
        self.note_evictions();
        tracing::debug!("dispatcher stopped");
    }

    fn note_evictions(&self) {
        let evicted = self.queue.take_evicted();
        if evicted > 0 {
            self.metrics.events_dropped.add("queue_full", evicted);
            tracing::warn!(evicted, "ingest queue full, oldest events dropped");
        }
    }

    /// Route one event. Never fails: anything undeliverable is dropped and counted.
    pub fn dispatch(&mut self, ev: RawEvent) {
        let RawEvent {
            emitter,
            kind,
            payload,
            user_data,
        } = ev;
        self.metrics.events_ingested.inc(kind.as_str());

        match (kind, payload) {
            (EventKind::Message, NativePayload::Message { text, data }) => {
                self.on_script_message(emitter, &text, data, user_data)
            }
            (EventKind::ChildAdded, NativePayload::ChildAdded(c)) => {
                self.deliver(emitter, kind, Record::Child(decode::child(c)))
            }
            (EventKind::SpawnAdded, NativePayload::SpawnAdded(s)) => {
                self.deliver(emitter, kind, Record::Spawn(s))
            }
            (EventKind::Output, NativePayload::Output { pid, fd, data }) => {
                self.deliver(emitter, kind, Record::Output(decode::output(pid, fd, data)))
            }
            (EventKind::FileChange, NativePayload::FileChange { path, other_path, event_type }) => {
                let ev = decode::file_event(path, other_path, event_type);
                self.deliver(emitter, kind, Record::FileChange(ev))
            }
            (kind, _) => {
                tracing::debug!(entity = %emitter, signal = %kind, "payload does not match signal");
                self.drop_event("kind_mismatch");
            }
        }
    }

    fn on_script_message(&mut self, emitter: EntityId, text: &str, data: Option<Bytes>, user_data: usize) {
        let Some(env) = decode_script_message(text) else {
            self.drop_event("malformed");
            return;
        };

        match env {
            ScriptEnvelope::Log { level, text } => log_script(emitter, level, &text),
            ScriptEnvelope::Rpc(reply) => self.on_rpc_reply(emitter, reply, data),
            ScriptEnvelope::Send { payload } => {
                let Some(index) = self.indices.advance(emitter, &self.registry) else {
                    tracing::debug!(entity = %emitter, "message from released entity");
                    self.drop_event("no_subscriber");
                    return;
                };
                let msg = Message {
                    index,
                    payload,
                    data,
                    user_data,
                };
                self.deliver(emitter, EventKind::Message, Record::Message(msg));
            }
        }
    }

    fn on_rpc_reply(&mut self, emitter: EntityId, reply: RpcReply, data: Option<Bytes>) {
        let key = CorrelationKey::request(emitter, reply.request_id.as_str());
        match self.table.resolve(&key) {
            Some(Target::Waiter(tx)) => {
                // Caller may have timed out between resolve and send; the reply is then dropped.
                if tx.send(RpcDelivery { reply, data }).is_ok() {
                    self.metrics.deliveries.inc("rpc");
                } else {
                    self.drop_event("no_waiter");
                }
            }
            Some(other) => {
                // Request keys only ever hold waiters.
                self.table.replace(key, other);
                self.drop_event("no_waiter");
            }
            None => {
                tracing::debug!(entity = %emitter, request_id = %reply.request_id, "rpc reply without waiter");
                self.drop_event("no_waiter");
            }
        }
    }

    fn deliver(&mut self, emitter: EntityId, kind: EventKind, record: Record) {
        let key = CorrelationKey::sink(emitter, kind);
        let Some(sink) = self.table.sink(&key) else {
            self.drop_event("no_subscriber");
            return;
        };

        match sink.offer(record) {
            Delivery::Delivered => self.metrics.deliveries.inc(kind.as_str()),
            Delivery::Full => {
                tracing::warn!(entity = %emitter, signal = %kind, "sink full, record dropped");
                self.drop_event("sink_full");
            }
            Delivery::Closed => {
                if self.table.remove_closed_sink(&key) {
                    tracing::debug!(entity = %emitter, signal = %kind, "closed sink unregistered");
                }
                self.drop_event("sink_closed");
            }
            Delivery::Mismatch => self.drop_event("kind_mismatch"),
        }
    }

    fn drop_event(&self, reason: &'static str) {
        self.metrics.events_dropped.inc(reason);
    }
}

fn log_script(emitter: EntityId, level: LogLevel, text: &str) {
    match level {
        LogLevel::Debug => {
            tracing::debug!(target: "fridabridge::script", entity = %emitter, level = level.as_str(), "{text}")
        }
        LogLevel::Info => {
            tracing::info!(target: "fridabridge::script", entity = %emitter, level = level.as_str(), "{text}")
        }
        LogLevel::Warning => {
            tracing::warn!(target: "fridabridge::script", entity = %emitter, level = level.as_str(), "{text}")
        }
        LogLevel::Error => {
            tracing::error!(target: "fridabridge::script", entity = %emitter, level = level.as_str(), "{text}")
        }
    }
}
