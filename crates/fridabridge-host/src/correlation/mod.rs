//! Correlation of asynchronous deliveries with the call or subscription expecting them.

mod table;

pub use table::{CorrelationKey, CorrelationTable, Discriminator, Target};
