use std::time::Duration;

use serde::Deserialize;
use fridabridge_core::error::{BridgeError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    #[serde(default)]
    pub ingest: IngestSection,

    #[serde(default)]
    pub rpc: RpcSection,

    #[serde(default)]
    pub sinks: SinkSection,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            ingest: IngestSection::default(),
            rpc: RpcSection::default(),
            sinks: SinkSection::default(),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BridgeError::UnsupportedVersion);
        }
        self.ingest.validate()?;
        self.rpc.validate()?;
        self.sinks.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestSection {
    /// Events buffered between engine threads and the dispatcher.
    #[serde(default = "default_ingest_capacity")]
    pub capacity: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            capacity: default_ingest_capacity(),
        }
    }
}

impl IngestSection {
    pub fn validate(&self) -> Result<()> {
        if !(16..=65536).contains(&self.capacity) {
            return Err(BridgeError::BadRequest(
                "ingest.capacity must be between 16 and 65536".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcSection {
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

impl RpcSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=600000).contains(&self.timeout_ms) {
            return Err(BridgeError::BadRequest(
                "rpc.timeout_ms must be between 10 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSection {
    /// Buffer size of channels created by the `subscribe_*` helpers.
    #[serde(default = "default_sink_capacity")]
    pub default_capacity: usize,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            default_capacity: default_sink_capacity(),
        }
    }
}

impl SinkSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65536).contains(&self.default_capacity) {
            return Err(BridgeError::BadRequest(
                "sinks.default_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_ingest_capacity() -> usize {
    1000
}
fn default_rpc_timeout_ms() -> u64 {
    60000
}
fn default_sink_capacity() -> usize {
    256
}
