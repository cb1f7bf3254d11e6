//! Protocol modules for messages exchanged with injected scripts.
//!
//! - `message`: inbound script messages (`log` / `send`), classified into log
//!   records, RPC replies, and plain messages.
//! - `rpc`: the outbound call envelope and request id scheme.
//!
//! Decoders are panic-free: input that is not JSON, or JSON of an unexpected
//! shape, yields `None` so the dispatcher can drop it without side effects.

pub mod message;
pub mod rpc;

pub use message::{decode_script_message, LogLevel, ScriptEnvelope};
pub use rpc::{encode_call, request_id, RpcOutcome, RpcReply, RPC_TAG};
