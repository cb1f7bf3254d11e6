//! fridabridge core: wire envelopes, RPC codec, and the error surface.
//!
//! This crate defines the message contracts exchanged with injected
//! instrumentation code and the error taxonomy shared by the host runtime. It
//! carries no runtime dependencies so the codecs can be exercised without an
//! engine or an async executor.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! Script messages come from code the host does not control, so every decoding
//! path reports an unexpected shape as `None`/`BridgeError` instead of crashing.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{BridgeError, ErrorKind, NativeError, Result};
