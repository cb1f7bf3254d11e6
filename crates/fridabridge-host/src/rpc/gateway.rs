use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Duration, Instant};

use fridabridge_core::error::{BridgeError, Result};
use fridabridge_core::protocol::{encode_call, request_id, RpcOutcome, RpcReply};

use crate::correlation::{CorrelationKey, CorrelationTable, Target};
use crate::entities::EntityId;
use crate::obs::metrics::BridgeMetrics;
use crate::types::RpcValue;

/// What the dispatcher hands to a waiting call.
#[derive(Debug)]
pub struct RpcDelivery {
    pub reply: RpcReply,
    pub data: Option<Bytes>,
}

/// One in-flight call. Dropping it unregisters the key, so every exit path
/// (reply, deadline, post failure, cancelled future) leaves no stale slot.
#[derive(Debug)]
pub struct PendingCall {
    key: CorrelationKey,
    created: Instant,
    deadline: Instant,
    table: Arc<CorrelationTable>,
}

impl PendingCall {
    pub fn key(&self) -> &CorrelationKey {
        &self.key
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.table.unregister(&self.key);
    }
}

/// Issues calls: builds envelopes, registers waiters, and awaits replies with a deadline.
pub struct RpcGateway {
    next_id: AtomicU64,
    default_timeout: Duration,
    table: Arc<CorrelationTable>,
    metrics: Arc<BridgeMetrics>,
}

impl RpcGateway {
    pub fn new(table: Arc<CorrelationTable>, metrics: Arc<BridgeMetrics>, default_timeout: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            default_timeout,
            table,
            metrics,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Call `method` on the script identified by `entity`.
    ///
    /// `post` transmits the encoded envelope; it runs after the waiter is
    /// registered so a fast reply cannot slip past.
    pub async fn call<P>(
        &self,
        entity: EntityId,
        method: &str,
        args: &[Value],
        deadline_after: Duration,
        post: P,
    ) -> Result<RpcValue>
    where
        P: FnOnce(&str) -> Result<()>,
    {
        let created = Instant::now();
        let deadline = created.checked_add(deadline_after).ok_or_else(|| {
            BridgeError::BadRequest(format!("rpc deadline out of range: {deadline_after:?}")).logged()
        })?;
        let request_id = request_id(self.next_id.fetch_add(1, Ordering::Relaxed));
        let envelope = encode_call(&request_id, method, args)?;
        let key = CorrelationKey::request(entity, request_id.as_str());

        let (tx, rx) = oneshot::channel::<RpcDelivery>();
        self.table.register(key.clone(), Target::Waiter(tx))?;
        let pending = PendingCall {
            key,
            created,
            deadline,
            table: Arc::clone(&self.table),
        };

        tracing::debug!(entity = %entity, request_id = %request_id, method, "rpc call");
        post(&envelope)?;

        let res = match timeout_at(deadline, rx).await {
            Ok(Ok(delivery)) => self.settle(method, delivery),
            // Slot dropped without an answer: the script was released mid-call.
            Ok(Err(_)) => Err(BridgeError::Released("script").logged()),
            Err(_) => {
                self.metrics.rpc_calls.inc("timeout");
                Err(BridgeError::Timeout {
                    method: method.to_string(),
                    after_ms: deadline_after.as_millis() as u64,
                }
                .logged())
            }
        };
        tracing::trace!(
            request_id = %request_id,
            elapsed_ms = pending.created().elapsed().as_millis() as u64,
            "rpc settled"
        );
        drop(pending);
        res
    }

    fn settle(&self, method: &str, delivery: RpcDelivery) -> Result<RpcValue> {
        let RpcDelivery { reply, data } = delivery;
        match reply.outcome {
            RpcOutcome::Ok => {
                self.metrics.rpc_calls.inc("ok");
                match data {
                    Some(bytes) if !bytes.is_empty() => Ok(RpcValue::Bytes(bytes)),
                    _ => Ok(RpcValue::Json(reply.first_result())),
                }
            }
            RpcOutcome::Error => {
                self.metrics.rpc_calls.inc("error");
                let msg = reply.error_message();
                tracing::error!(method, request_id = %reply.request_id, "{msg}");
                Err(BridgeError::Rpc(msg))
            }
        }
    }
}
