//! Shared bridge state.
//!
//! Wires the ingestion queue, correlation table, RPC gateway, and handle
//! registry together, and owns the dispatcher task. Entities hold a clone of
//! [`Bridge`] to reach the engine and the shared tables.

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use fridabridge_core::error::{BridgeError, Result};

use crate::config::BridgeConfig;
use crate::correlation::CorrelationTable;
use crate::dispatch::{Dispatcher, MessageIndices};
use crate::engine::Engine;
use crate::entities::{DeviceManager, EntityId, EntityRecord, FileMonitor, HandleRegistry, Session};
use crate::ingest::IngestQueue;
use crate::obs::metrics::BridgeMetrics;
use crate::rpc::RpcGateway;

#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    engine: Arc<dyn Engine>,
    cfg: BridgeConfig,
    registry: Arc<HandleRegistry>,
    indices: Arc<MessageIndices>,
    table: Arc<CorrelationTable>,
    queue: Arc<IngestQueue>,
    metrics: Arc<BridgeMetrics>,
    rpc: RpcGateway,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for BridgeInner {
    fn drop(&mut self) {
        self.queue.close();
    }
}

impl Bridge {
    /// Build the bridge and spawn its dispatcher on the current tokio runtime.
    pub fn start(engine: Arc<dyn Engine>, cfg: BridgeConfig) -> Result<Self> {
        cfg.validate()?;
        let rt = Handle::try_current()
            .map_err(|e| BridgeError::Internal(format!("bridge needs a tokio runtime: {e}")))?;

        let queue = Arc::new(IngestQueue::new(cfg.ingest.capacity));
        let table = Arc::new(CorrelationTable::new());
        let metrics = Arc::new(BridgeMetrics::new());
        let rpc = RpcGateway::new(Arc::clone(&table), Arc::clone(&metrics), cfg.rpc.timeout());

        let registry = Arc::new(HandleRegistry::new());
        let indices = Arc::new(MessageIndices::new());

        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&table),
            Arc::clone(&metrics),
            Arc::clone(&registry),
            Arc::clone(&indices),
        );
        let task = rt.spawn(dispatcher.run());

        tracing::info!(
            ingest_capacity = cfg.ingest.capacity,
            rpc_timeout_ms = cfg.rpc.timeout_ms,
            "bridge started"
        );

        Ok(Self {
            inner: Arc::new(BridgeInner {
                engine,
                cfg,
                registry,
                indices,
                table,
                queue,
                metrics,
                rpc,
                dispatcher: Mutex::new(Some(task)),
            }),
        })
    }

    /// Stop accepting events, let the dispatcher drain, and wait for it.
    pub async fn shutdown(&self) {
        self.inner.queue.close();
        let task = self.inner.dispatcher.lock().ok().and_then(|mut g| g.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "dispatcher task ended abnormally");
            }
        }
        tracing::info!("bridge stopped");
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Prometheus text for the bridge counters and current queue/table sizes.
    pub fn render_metrics(&self) -> String {
        self.inner.metrics.render(&[
            ("fridabridge_ingest_queue_depth", self.inner.queue.len() as u64),
            ("fridabridge_pending_correlations", self.inner.table.len() as u64),
            ("fridabridge_live_entities", self.inner.registry.len() as u64),
        ])
    }

    pub fn live_entities(&self) -> Vec<(EntityId, EntityRecord)> {
        self.inner.registry.live_entities()
    }

    /// Number of registered sinks and in-flight calls.
    pub fn pending_correlations(&self) -> usize {
        self.inner.table.len()
    }

    pub fn device_manager(&self) -> Result<DeviceManager> {
        DeviceManager::open(self)
    }

    pub fn file_monitor(&self, path: &str) -> Result<FileMonitor> {
        FileMonitor::open(self, path)
    }

    /// Attach to `pid` on the local device.
    pub fn attach(&self, pid: u32) -> Result<Session> {
        tracing::debug!(pid, "attach");
        let device = self.device_manager()?.get_local_device()?;
        tracing::debug!(name = %device.name(), id = %device.id(), "local device");
        device.attach(pid)
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.inner.engine
    }

    pub(crate) fn registry(&self) -> &HandleRegistry {
        &self.inner.registry
    }

    pub(crate) fn table(&self) -> &CorrelationTable {
        &self.inner.table
    }

    pub(crate) fn queue(&self) -> Arc<IngestQueue> {
        Arc::clone(&self.inner.queue)
    }

    pub(crate) fn rpc(&self) -> &RpcGateway {
        &self.inner.rpc
    }

    /// Number of entities with a live message counter.
    pub fn tracked_message_counters(&self) -> usize {
        self.inner.indices.len()
    }

    /// Drop an entity from the inventory along with its sinks, pending calls
    /// and message counter.
    pub(crate) fn forget(&self, id: EntityId) {
        if self.inner.registry.forget(id).is_some() {
            self.inner.indices.forget(id);
            let purged = self.inner.table.purge_entity(id);
            if purged > 0 {
                tracing::debug!(entity = %id, purged, "correlation entries purged");
            }
        }
    }
}
