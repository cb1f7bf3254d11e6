//! Dispatcher module exports.
//!
//! The dispatcher is the single consumer of the ingestion queue; `decode`
//! turns native signal arguments into host records; `indices` numbers plain
//! script messages per entity.

pub mod decode;
pub mod dispatcher;
pub mod indices;

pub use dispatcher::Dispatcher;
pub use indices::MessageIndices;
