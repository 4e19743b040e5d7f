use std::sync::{Arc, Mutex, OnceLock};

use crate::capability::Capabilities;
use crate::device::{Device, HardwareOps};
use crate::error::{Error, Result};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide catalog of registered capture devices.
///
/// Drivers register a device once per physical or logical endpoint;
/// applications open devices by name. All catalog operations are guarded
/// by a single lock. Tests can use their own `Registry` instance; the
/// process-wide one is reached through [`Registry::global`].
#[derive(Default)]
pub struct Registry {
    devices: Mutex<Vec<Arc<Device>>>,
}

impl Registry {
    /// Returns an empty registry
    pub fn new() -> Self {
        Registry::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Registers a device under a unique name.
    ///
    /// The device gets the lowest numeric id not currently in use.
    ///
    /// # Arguments
    ///
    /// * `name` - Device name, unique within this registry
    /// * `ops` - Hardware operations table
    /// * `caps` - Physical capability flags
    /// * `device_caps` - Device capability sub-mask
    pub fn register(
        &self,
        name: &str,
        ops: Box<dyn HardwareOps>,
        caps: Capabilities,
        device_caps: Capabilities,
    ) -> Result<Arc<Device>> {
        let mut devices = self.devices.lock().unwrap();

        if devices.iter().any(|device| device.name() == name) {
            log::error!("device name={} has been registered", name);
            return Err(Error::InvalidArgument);
        }

        let mut id = 0;
        while devices.iter().any(|device| device.id() == id) {
            id += 1;
        }

        let device = Arc::new(Device::new(name, id, ops, caps, device_caps)?);
        devices.push(Arc::clone(&device));
        Ok(device)
    }

    /// Removes a device from the catalog
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut devices = self.devices.lock().unwrap();
        match devices.iter().position(|device| device.name() == name) {
            Some(pos) => {
                devices.remove(pos);
                Ok(())
            }
            None => {
                log::error!("device name={} not found", name);
                Err(Error::NotFound)
            }
        }
    }

    /// Finds a registered device without initializing its hardware
    pub fn lookup(&self, name: &str) -> Option<Arc<Device>> {
        let devices = self.devices.lock().unwrap();
        devices
            .iter()
            .find(|device| device.name() == name)
            .map(Arc::clone)
    }

    /// Opens a device by name, initializing its hardware and resetting
    /// all stream state
    pub fn open(&self, name: &str) -> Result<Arc<Device>> {
        let device = self.lookup(name).ok_or_else(|| {
            log::error!("device name={} not found", name);
            Error::NotFound
        })?;

        device.open()?;
        Ok(device)
    }

    /// All registered devices
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferInfo, Type};
    use crate::format::Format;
    use crate::memory::MemFlags;

    struct NullOps;

    impl HardwareOps for NullOps {
        fn start(&self, _device: &Device, _direction: Type) -> Result<()> {
            Ok(())
        }

        fn stop(&self, _device: &Device, _direction: Type) -> Result<()> {
            Ok(())
        }

        fn set_format(
            &self,
            _device: &Device,
            _direction: Type,
            format: &Format,
        ) -> Result<BufferInfo> {
            Ok(BufferInfo {
                count: 0,
                size: format.frame_size(),
                align: 4,
                caps: MemFlags::BYTE_ACCESS,
            })
        }
    }

    fn caps() -> Capabilities {
        Capabilities::VIDEO_CAPTURE | Capabilities::STREAMING
    }

    #[test]
    fn register_assigns_lowest_unused_id() {
        let registry = Registry::new();
        let cam0 = registry
            .register("cam0", Box::new(NullOps), caps(), caps())
            .unwrap();
        let cam1 = registry
            .register("cam1", Box::new(NullOps), caps(), caps())
            .unwrap();
        assert_eq!(cam0.id(), 0);
        assert_eq!(cam1.id(), 1);

        registry.unregister("cam0").unwrap();
        let cam2 = registry
            .register("cam2", Box::new(NullOps), caps(), caps())
            .unwrap();
        assert_eq!(cam2.id(), 0);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = Registry::new();
        registry
            .register("cam0", Box::new(NullOps), caps(), caps())
            .unwrap();
        let err = registry
            .register("cam0", Box::new(NullOps), caps(), caps())
            .err();
        assert_eq!(err, Some(Error::InvalidArgument));
    }

    #[test]
    fn open_unknown_name_is_not_found() {
        let registry = Registry::new();
        assert_eq!(registry.open("nope").err(), Some(Error::NotFound));
    }

    #[test]
    fn unregister_unknown_name_is_not_found() {
        let registry = Registry::new();
        assert_eq!(registry.unregister("nope").err(), Some(Error::NotFound));
    }

    #[test]
    fn devices_without_a_direction_are_rejected() {
        let registry = Registry::new();
        let err = registry
            .register(
                "bad",
                Box::new(NullOps),
                Capabilities::STREAMING,
                Capabilities::STREAMING,
            )
            .err();
        assert_eq!(err, Some(Error::InvalidArgument));
    }
}
