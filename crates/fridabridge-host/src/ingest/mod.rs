//! Event ingestion: the only code that runs on the engine's threads.
//!
//! A [`Trampoline`] turns a signal emission into a [`RawEvent`] and pushes it
//! onto the [`IngestQueue`]; everything else happens in the dispatcher.

mod queue;
mod trampoline;

pub use queue::{IngestQueue, RawEvent};
pub use trampoline::Trampoline;
