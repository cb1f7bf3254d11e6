//! fridabridge host library entry.
//!
//! This crate wires the ingestion queue, dispatcher, correlation table, RPC
//! gateway, and entity wrappers on top of an [`engine::Engine`]
//! implementation. It is consumed by embedders and by integration tests.

pub mod bridge;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod engine;
pub mod entities;
pub mod ingest;
pub mod obs;
pub mod rpc;
pub mod signals;
pub mod types;

pub use bridge::Bridge;
pub use entities::{Device, DeviceManager, EntityId, FileMonitor, Script, ScriptState, Session};
pub use signals::{EventKind, Sink};
