//! RPC calls into injected scripts.

mod gateway;

pub use gateway::{PendingCall, RpcDelivery, RpcGateway};
