//! YAML loader for [`BridgeConfig`].
//!
//! Unknown keys fail at every level and ranges are checked here, so
//! `Bridge::start` only ever sees a validated ingest capacity, RPC deadline
//! and sink capacity.

pub mod schema;

use std::fs;

use fridabridge_core::error::{BridgeError, Result};

pub use schema::{BridgeConfig, IngestSection, RpcSection, SinkSection};

/// Read and validate a config file. I/O failures surface as `Internal`.
pub fn load_from_file(path: &str) -> Result<BridgeConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| BridgeError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<BridgeConfig> {
    let cfg: BridgeConfig = serde_yaml::from_str(s)
        .map_err(|e| BridgeError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
