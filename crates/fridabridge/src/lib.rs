//! Top-level facade crate for fridabridge.
//!
//! Re-exports the wire/error core and the host runtime so users can depend on a single crate.

pub mod core {
    pub use fridabridge_core::*;
}

pub mod host {
    pub use fridabridge_host::*;
}
