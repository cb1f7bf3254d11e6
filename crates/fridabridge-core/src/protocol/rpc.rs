//! RPC envelopes.
//!
//! Outbound: `["frida:rpc", <request id>, "call", <method>, <arg>...]`.
//! Inbound:  `["frida:rpc", <request id>, "ok" | "error", <result>...]`.

use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Sentinel in element 0 of every RPC envelope.
pub const RPC_TAG: &str = "frida:rpc";

/// Operation tag of an outbound call.
pub const CALL_OP: &str = "call";

/// Request id for the n-th call issued by a bridge.
pub fn request_id(n: u64) -> String {
    format!("req_{n}")
}

/// Encode an outbound call envelope as JSON text.
pub fn encode_call(request_id: &str, method: &str, args: &[Value]) -> Result<String> {
    let mut envelope = Vec::with_capacity(args.len() + 4);
    envelope.push(Value::from(RPC_TAG));
    envelope.push(Value::from(request_id));
    envelope.push(Value::from(CALL_OP));
    envelope.push(Value::from(method));
    envelope.extend(args.iter().cloned());

    serde_json::to_string(&envelope)
        .map_err(|e| BridgeError::Protocol(format!("rpc envelope encode failed: {e}")))
}

/// Outcome tag of an inbound reply. Anything but `"ok"` is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcOutcome {
    Ok,
    Error,
}

impl RpcOutcome {
    pub fn from_tag(tag: &str) -> Self {
        if tag == "ok" {
            RpcOutcome::Ok
        } else {
            RpcOutcome::Error
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RpcOutcome::Ok => "ok",
            RpcOutcome::Error => "error",
        }
    }
}

/// Parsed inbound reply (binary data travels separately).
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub request_id: String,
    pub outcome: RpcOutcome,
    pub results: Vec<Value>,
}

impl RpcReply {
    /// Parse a `send` payload that starts with [`RPC_TAG`].
    ///
    /// Returns `None` when element 0 is not the tag or when the id/outcome
    /// slots have the wrong shape.
    pub fn from_payload(items: &[Value]) -> Option<Self> {
        let (tag, rest) = items.split_first()?;
        if tag.as_str() != Some(RPC_TAG) {
            return None;
        }
        let (id, rest) = rest.split_first()?;
        let request_id = match id {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let (outcome, results) = rest.split_first()?;
        let outcome = RpcOutcome::from_tag(outcome.as_str()?);

        Some(Self {
            request_id,
            outcome,
            results: results.to_vec(),
        })
    }

    /// First result slot, or `null` when the reply carried none.
    pub fn first_result(&self) -> Value {
        self.results.first().cloned().unwrap_or(Value::Null)
    }

    /// Error text carried by an `"error"` reply.
    pub fn error_message(&self) -> String {
        match self.results.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "rpc call failed".to_string(),
        }
    }
}
