//! Simulated hardware collaborators driving the core in tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use vcap::buffer::{BufferInfo, Type};
use vcap::fourcc::pixelformat;
use vcap::{Capabilities, Device, Error, Event, Format, FourCC, HardwareOps, MemFlags, Result};

/// Call counters shared between a test and its simulated sensor.
#[derive(Default)]
pub struct SensorState {
    pub init_calls: AtomicU32,
    pub deinit_calls: AtomicU32,
    pub start_calls: AtomicU32,
    pub stop_calls: AtomicU32,
    pub running: AtomicBool,
}

/// A simulated capture sensor.
///
/// Frames are produced by the test itself through the producer-side pool
/// API (`take_queued` + `complete`), standing in for the interrupt handler
/// of a real capture controller.
pub struct SimSensor {
    pub state: Arc<SensorState>,
}

impl SimSensor {
    pub fn new() -> (Self, Arc<SensorState>) {
        let state = Arc::new(SensorState::default());
        (
            SimSensor {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl HardwareOps for SimSensor {
    fn init(&self, _device: &Device) -> Result<()> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deinit(&self, _device: &Device) -> Result<()> {
        self.state.deinit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn start(&self, _device: &Device, _direction: Type) -> Result<()> {
        self.state.start_calls.fetch_add(1, Ordering::SeqCst);
        self.state.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self, _device: &Device, _direction: Type) -> Result<()> {
        self.state.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.state.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn set_format(&self, _device: &Device, _direction: Type, format: &Format) -> Result<BufferInfo> {
        Ok(BufferInfo {
            count: 0,
            size: format.frame_size(),
            align: 4,
            caps: MemFlags::DMA | MemFlags::BYTE_ACCESS,
        })
    }

    fn enum_format(&self, _device: &Device, _direction: Type, index: u32) -> Result<FourCC> {
        match index {
            0 => Ok(pixelformat::GREY),
            1 => Ok(pixelformat::RGB565),
            _ => Err(Error::InvalidArgument),
        }
    }

    fn set_control(&self, _id: u32, _value: i32) -> Result<()> {
        Ok(())
    }

    fn get_control(&self, _id: u32) -> Result<i32> {
        Ok(0)
    }
}

/// A software transform device: inverts every payload byte from the
/// output (source) stream into the capture (result) stream.
///
/// Plays the role of a codec-style memory-to-memory collaborator: the
/// transform runs inside the trigger notification, synchronously with the
/// capture-side dequeue that requested it.
pub struct SwInverter;

impl HardwareOps for SwInverter {
    fn start(&self, _device: &Device, _direction: Type) -> Result<()> {
        Ok(())
    }

    fn stop(&self, _device: &Device, _direction: Type) -> Result<()> {
        Ok(())
    }

    fn set_format(&self, _device: &Device, _direction: Type, format: &Format) -> Result<BufferInfo> {
        Ok(BufferInfo {
            count: 0,
            size: format.frame_size(),
            align: 4,
            caps: MemFlags::BYTE_ACCESS,
        })
    }

    fn notify(&self, device: &Device, event: Event) -> Result<()> {
        if event != Event::M2mTrigger(Type::VideoCapture) {
            return Ok(());
        }

        let cap_format = device.format(Type::VideoCapture)?;
        let out_format = device.format(Type::VideoOutput)?;
        if cap_format.width != out_format.width || cap_format.height != out_format.height {
            return Err(Error::InvalidArgument);
        }

        let (mut capture, output) = match device.m2m_take_queued_pair()? {
            Some(pair) => pair,
            // nothing to transform yet, the next dequeue retries
            None => return Ok(()),
        };

        let source = output.with_data(|data| data.to_vec());
        let len = out_format.frame_size() as usize;
        capture.with_data_mut(|data| {
            for (dst, src) in data[..len].iter_mut().zip(source[..len].iter()) {
                *dst = !*src;
            }
        });

        device.m2m_complete_pair(capture, len as u32, output);
        Ok(())
    }
}

/// Registers and opens a simulated capture device on a private registry.
pub fn open_sim_sensor(name: &str) -> (Arc<Device>, Arc<SensorState>, vcap::Registry) {
    let registry = vcap::Registry::new();
    let (sensor, state) = SimSensor::new();
    let device_caps = Capabilities::VIDEO_CAPTURE | Capabilities::STREAMING;
    let caps = device_caps | Capabilities::DEVICE_CAPS;
    registry
        .register(name, Box::new(sensor), caps, device_caps)
        .unwrap();
    let device = registry.open(name).unwrap();
    (device, state, registry)
}

/// Registers and opens a software transform device on a private registry.
pub fn open_sw_inverter(name: &str) -> (Arc<Device>, vcap::Registry) {
    let registry = vcap::Registry::new();
    let device_caps = Capabilities::VIDEO_M2M | Capabilities::STREAMING;
    let caps = device_caps | Capabilities::DEVICE_CAPS;
    registry
        .register(name, Box::new(SwInverter), caps, device_caps)
        .unwrap();
    let device = registry.open(name).unwrap();
    (device, registry)
}
