use fridabridge_core::error::{check, BridgeError, Result};

use crate::bridge::Bridge;
use crate::engine::Cancellable;
use crate::types::DeviceType;

use super::{Device, EntityCore, EntityId, EntityKind};

/// Entry point for device discovery.
pub struct DeviceManager {
    core: EntityCore,
}

impl DeviceManager {
    pub(crate) fn open(bridge: &Bridge) -> Result<Self> {
        let handle = check(bridge.engine().device_manager_new())?;
        Ok(Self {
            core: EntityCore::new(bridge, EntityKind::DeviceManager, "device manager", handle),
        })
    }

    pub fn entity_id(&self) -> EntityId {
        self.core.id
    }

    pub fn enumerate_devices(&self) -> Result<Vec<Device>> {
        self.enumerate_devices_cancellable(&Cancellable::new())
    }

    pub fn enumerate_devices_cancellable(&self, cancel: &Cancellable) -> Result<Vec<Device>> {
        let descriptors = self
            .core
            .live(|h| check(self.core.engine().enumerate_devices(h, cancel)))?;
        Ok(descriptors
            .into_iter()
            .map(|d| Device::new(&self.core.bridge, d))
            .collect())
    }

    pub fn get_device(&self, id: &str) -> Result<Device> {
        self.get_device_matching(|d| d.id() == id)
    }

    /// First device for which `pred` holds, or `NoDevice`.
    pub fn get_device_matching<F>(&self, pred: F) -> Result<Device>
    where
        F: Fn(&Device) -> bool,
    {
        self.enumerate_devices()?
            .into_iter()
            .find(|d| pred(d))
            .ok_or_else(|| BridgeError::NoDevice.logged())
    }

    pub fn get_local_device(&self) -> Result<Device> {
        self.get_device_matching(|d| d.kind() == DeviceType::Local)
    }

    pub fn get_usb_device(&self) -> Result<Device> {
        self.get_device_matching(|d| d.kind() == DeviceType::Usb)
    }

    pub fn get_remote_device(&self) -> Result<Device> {
        self.get_device_matching(|d| d.kind() == DeviceType::Remote)
    }

    /// Close the manager. Further calls fail with a released-handle error.
    pub fn close(&self) -> Result<()> {
        let cancel = Cancellable::new();
        self.core
            .release(|h| check(self.core.engine().device_manager_close(h, &cancel)))
    }

    pub fn is_closed(&self) -> bool {
        self.core.cell.is_released()
    }
}
