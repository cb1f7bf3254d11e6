//! Inbound script messages.
//!
//! Wire format is a JSON object with a required `type`:
//! - `{"type":"log","level":"info","payload":"text"}`
//! - `{"type":"send","payload":<any>}`
//!
//! A `send` whose payload is an array led by [`RPC_TAG`] is an RPC reply;
//! every other `send` is a plain message.

use serde_json::{Map, Value};

use super::rpc::{RpcReply, RPC_TAG};

/// Level named by a script `log` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Unknown levels are treated as `info`.
    pub fn parse(s: &str) -> Self {
        match s {
            "debug" => LogLevel::Debug,
            "warning" | "warn" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Classified script message.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEnvelope {
    Log { level: LogLevel, text: String },
    Rpc(RpcReply),
    Send { payload: Value },
}

/// Decode a raw script message.
///
/// Returns `None` for invalid JSON, a missing or unknown `type`, or fields of
/// the wrong shape. Callers drop such messages.
pub fn decode_script_message(text: &str) -> Option<ScriptEnvelope> {
    let value: Value = serde_json::from_str(text).ok()?;
    let Value::Object(obj) = value else {
        return None;
    };
    decode_object(obj)
}

fn decode_object(mut obj: Map<String, Value>) -> Option<ScriptEnvelope> {
    match obj.get("type")?.as_str()? {
        "log" => {
            let level = LogLevel::parse(obj.get("level")?.as_str()?);
            let text = match obj.remove("payload")? {
                Value::String(s) => s,
                _ => return None,
            };
            Some(ScriptEnvelope::Log { level, text })
        }
        "send" => {
            let payload = obj.remove("payload")?;
            if let Value::Array(items) = &payload {
                if items.first().and_then(Value::as_str) == Some(RPC_TAG) {
                    // Tagged but malformed replies are dropped, not surfaced as plain messages.
                    return RpcReply::from_payload(items).map(ScriptEnvelope::Rpc);
                }
            }
            Some(ScriptEnvelope::Send { payload })
        }
        _ => None,
    }
}
