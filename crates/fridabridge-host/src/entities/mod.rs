//! Host-side wrappers around native engine objects.
//!
//! Each wrapper owns one guarded native handle plus metadata read once at
//! creation. Blocking operations go through [`handle::EntityCore::live`] and
//! are translated with the core error translator.

mod device;
mod device_manager;
mod file_monitor;
mod handle;
mod registry;
mod script;
mod session;

pub use device::Device;
pub use device_manager::DeviceManager;
pub use file_monitor::FileMonitor;
pub use registry::{EntityId, EntityKind, EntityRecord, HandleRegistry};
pub use script::{Script, ScriptState};
pub use session::Session;

pub(crate) use handle::EntityCore;
