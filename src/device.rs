use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::buffer::{BufferInfo, Type};
use crate::capability::Capabilities;
use crate::control;
use crate::error::{Error, Result};
use crate::format::{self, Description, Format};
use crate::fourcc::FourCC;
use crate::fraction::Fraction;
use crate::pool::{Dequeued, Element, Pool};
use crate::stream::Stream;

/// Events delivered to the hardware collaborator's notify hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A buffer was queued on the given stream
    BufferQueued(Type),
    /// A capture-side dequeue wants the transform of a memory-to-memory
    /// device to run
    M2mTrigger(Type),
}

/// Operations table implemented by each hardware collaborator.
///
/// The core holds the collaborator as a trait object and calls these hooks
/// for everything hardware-specific: bring-up, stream start/stop, format
/// negotiation and the memory-to-memory trigger. Hooks must not block for
/// unbounded time; the collaborator hands filled buffers back through
/// [`Element::complete`] from its own interrupt or task context.
pub trait HardwareOps: Send + Sync {
    /// Hardware bring-up, invoked once per device open
    fn init(&self, device: &Device) -> Result<()> {
        let _ = device;
        Ok(())
    }

    /// Hardware shutdown, invoked on device close
    fn deinit(&self, device: &Device) -> Result<()> {
        let _ = device;
        Ok(())
    }

    /// Begin producing (or consuming) buffers on `direction`
    fn start(&self, device: &Device, direction: Type) -> Result<()>;

    /// Stop the stream; no further completions for `direction` may be
    /// issued after this returns
    fn stop(&self, device: &Device, direction: Type) -> Result<()>;

    /// Validates `format` for `direction` and returns the buffer geometry
    /// frames of that format require
    fn set_format(&self, device: &Device, direction: Type, format: &Format) -> Result<BufferInfo>;

    /// Enumerate the pixelformats supported on `direction`
    fn enum_format(&self, device: &Device, direction: Type, index: u32) -> Result<FourCC> {
        let _ = (device, direction, index);
        Err(Error::Unsupported)
    }

    /// Out-of-band event notification; memory-to-memory devices run their
    /// transform on [`Event::M2mTrigger`]
    fn notify(&self, device: &Device, event: Event) -> Result<()> {
        let _ = (device, event);
        Ok(())
    }

    /// Set an extended control value
    fn set_control(&self, id: u32, value: i32) -> Result<()> {
        let _ = (id, value);
        Err(Error::Unsupported)
    }

    /// Get an extended control value
    fn get_control(&self, id: u32) -> Result<i32> {
        let _ = id;
        Err(Error::Unsupported)
    }

    /// Describe an extended control
    fn query_control(&self, id: u32) -> Result<control::Desc> {
        let _ = id;
        Err(Error::Unsupported)
    }
}

/// A named, registered capture endpoint.
///
/// Owns one stream (plain capture or output device) or two (memory-to-
/// memory device: capture first, output second) and the hardware
/// collaborator that moves the pixel data.
pub struct Device {
    name: String,
    id: u32,
    caps: Capabilities,
    device_caps: Capabilities,
    ops: Box<dyn HardwareOps>,
    streams: Box<[Mutex<Stream>]>,
}

impl Device {
    pub(crate) fn new(
        name: &str,
        id: u32,
        ops: Box<dyn HardwareOps>,
        caps: Capabilities,
        device_caps: Capabilities,
    ) -> Result<Self> {
        let streams = if caps.contains(Capabilities::VIDEO_M2M) {
            vec![
                Mutex::new(Stream::new(Type::VideoCapture)),
                Mutex::new(Stream::new(Type::VideoOutput)),
            ]
        } else if caps.contains(Capabilities::VIDEO_CAPTURE) {
            vec![Mutex::new(Stream::new(Type::VideoCapture))]
        } else if caps.contains(Capabilities::VIDEO_OUTPUT) {
            vec![Mutex::new(Stream::new(Type::VideoOutput))]
        } else {
            return Err(Error::InvalidArgument);
        };

        Ok(Device {
            name: name.to_string(),
            id,
            caps,
            device_caps,
            ops,
            streams: streams.into_boxed_slice(),
        })
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry-assigned numeric id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Physical capability mask
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Device capability sub-mask
    pub fn device_capabilities(&self) -> Capabilities {
        self.device_caps
    }

    /// Human-readable device description
    pub fn description(&self) -> String {
        format!("{} ({})", self.name, self.caps)
    }

    fn stream_index(&self, direction: Type) -> Result<usize> {
        if self.caps.contains(Capabilities::VIDEO_M2M) {
            match direction {
                Type::VideoCapture => Ok(0),
                Type::VideoOutput => Ok(1),
            }
        } else if self.caps.contains(Capabilities::VIDEO_CAPTURE) && direction == Type::VideoCapture
        {
            Ok(0)
        } else if self.caps.contains(Capabilities::VIDEO_OUTPUT) && direction == Type::VideoOutput {
            Ok(0)
        } else {
            Err(Error::InvalidArgument)
        }
    }

    /// Locks the stream for `direction`
    pub fn stream(&self, direction: Type) -> Result<MutexGuard<'_, Stream>> {
        let index = self.stream_index(direction)?;
        Ok(self.streams[index].lock().unwrap())
    }

    /// Hardware init; invoked by the registry on open.
    ///
    /// Resets all stream state, so a re-opened device starts unconfigured.
    pub(crate) fn open(&self) -> Result<()> {
        self.ops.init(self).map_err(|err| {
            log::error!("{}: init failed: {}", self.name, err);
            err
        })?;

        for stream in self.streams.iter() {
            stream.lock().unwrap().reset();
        }
        Ok(())
    }

    /// Hardware deinit; destroys all buffer pools.
    pub fn close(&self) -> Result<()> {
        self.ops.deinit(self).map_err(|err| {
            log::error!("{}: deinit failed: {}", self.name, err);
            err
        })?;

        for stream in self.streams.iter() {
            let mut stream = stream.lock().unwrap();
            if stream.is_streaming() {
                stream.mark_stopped()?;
            }
            stream.release_buffers()?;
        }
        Ok(())
    }

    /// Current format of `direction`
    pub fn format(&self, direction: Type) -> Result<Format> {
        self.stream(direction)?.format()
    }

    /// Validates and applies `format` on `direction`.
    ///
    /// The hardware collaborator computes the per-buffer size, alignment
    /// and memory capabilities for the format; those are stored with it.
    pub fn set_format(&self, direction: Type, format: &Format) -> Result<Format> {
        let format = self.try_format(direction, format)?;

        {
            let stream = self.stream(direction)?;
            if stream.is_streaming() {
                return Err(Error::InvalidState);
            }
        }

        let requirements = self.ops.set_format(self, direction, &format).map_err(|err| {
            log::error!("{}: set_format failed: {}", self.name, err);
            err
        })?;

        self.stream(direction)?.accept_format(format, requirements)?;
        Ok(format)
    }

    /// Validates `format` for `direction` without touching any state.
    ///
    /// Returns the format with the pixel depth normalized from the
    /// pixel-format table.
    pub fn try_format(&self, direction: Type, format: &Format) -> Result<Format> {
        self.stream_index(direction)?;

        let bpp = format::bits_per_pixel(format.fourcc).ok_or(Error::InvalidArgument)?;
        if format.width == 0 || format.height == 0 {
            return Err(Error::InvalidArgument);
        }

        let mut format = *format;
        format.bpp = bpp;
        Ok(format)
    }

    /// Enumerates the pixelformats of `direction` by index
    pub fn enum_format(&self, direction: Type, index: u32) -> Result<Description> {
        self.stream_index(direction)?;

        let fourcc = self.ops.enum_format(self, direction, index)?;
        match format::describe(fourcc) {
            Some(description) => Ok(Description {
                fourcc,
                description,
            }),
            None => {
                log::error!("{}: no description for format {}", self.name, fourcc);
                Err(Error::InvalidArgument)
            }
        }
    }

    /// Replaces the buffer pool of `direction` with `count` fresh buffers
    /// sized per the stored format
    pub fn request_buffers(&self, direction: Type, count: u32) -> Result<()> {
        self.stream(direction)?.request_buffers(count)
    }

    /// Buffer geometry of `direction`
    pub fn buffer_info(&self, direction: Type) -> Result<BufferInfo> {
        let stream = self.stream(direction)?;
        stream.pool()?;
        Ok(stream.buffer_info())
    }

    /// The live buffer pool of `direction`.
    ///
    /// Callers hold the returned handle to map payloads; the pool itself
    /// stays owned by the stream.
    pub fn buffer_pool(&self, direction: Type) -> Result<Arc<Pool>> {
        Ok(Arc::clone(self.stream(direction)?.pool()?))
    }

    /// Starts streaming on `direction`
    pub fn start(&self, direction: Type) -> Result<()> {
        {
            let stream = self.stream(direction)?;
            if stream.is_streaming() {
                return Err(Error::InvalidState);
            }
            stream.pool()?;
        }

        self.ops.start(self, direction).map_err(|err| {
            log::error!("{}: start failed: {}", self.name, err);
            err
        })?;

        self.stream(direction)?.mark_started()
    }

    /// Stops streaming on `direction`.
    ///
    /// After this returns the collaborator must not complete any more
    /// buffers for the stream until the next start.
    pub fn stop(&self, direction: Type) -> Result<()> {
        {
            let stream = self.stream(direction)?;
            if !stream.is_streaming() {
                return Err(Error::InvalidState);
            }
        }

        self.ops.stop(self, direction).map_err(|err| {
            log::error!("{}: stop failed: {}", self.name, err);
            err
        })?;

        self.stream(direction)?.mark_stopped()
    }

    /// Queues buffer `index` on `direction` for the producer
    pub fn queue_buffer(&self, direction: Type, index: u32) -> Result<()> {
        let pool = self.buffer_pool(direction)?;
        pool.queue(index)?;

        if let Err(err) = self.ops.notify(self, Event::BufferQueued(direction)) {
            log::debug!("{}: queue notify ignored: {}", self.name, err);
        }
        Ok(())
    }

    /// Waits for the next completed buffer on `direction`.
    ///
    /// For a memory-to-memory device the transform trigger runs first, so
    /// a queued capture/output pair has a chance to produce the completed
    /// buffer this call then waits for.
    pub fn dequeue_buffer(&self, direction: Type, timeout: Option<Duration>) -> Result<Dequeued> {
        let pool = self.buffer_pool(direction)?;

        if self.device_caps.contains(Capabilities::VIDEO_M2M) {
            self.ops.notify(self, Event::M2mTrigger(direction))?;
        }

        pool.take_done(timeout)
    }

    /// Producer side: checks out the next queued buffer of `direction`
    /// for filling.
    ///
    /// Never blocks; returns `None` when nothing is queued or no pool
    /// exists.
    pub fn take_queued(&self, direction: Type) -> Option<Element> {
        let pool = self.buffer_pool(direction).ok()?;
        pool.take_queued()
    }

    /// Producer side: checks out a free buffer of `direction`.
    pub fn alloc_buffer(&self, direction: Type) -> Option<Element> {
        let pool = self.buffer_pool(direction).ok()?;
        pool.alloc()
    }

    /// Frame interval of `direction` as a fraction
    pub fn params(&self, direction: Type) -> Result<Fraction> {
        let format = self.format(direction)?;
        Ok(Fraction::new(1, format.fps))
    }

    /// Sets the frame interval of `direction`.
    ///
    /// Only integer frame rates are representable: the numerator must
    /// be 1. Re-negotiates the format with the collaborator.
    pub fn set_params(&self, direction: Type, interval: &Fraction) -> Result<Fraction> {
        if interval.numerator != 1 {
            return Err(Error::InvalidArgument);
        }

        let mut format = self.format(direction)?;
        format.fps = interval.denominator;

        let requirements = self.ops.set_format(self, direction, &format)?;
        self.stream(direction)?.accept_format(format, requirements)?;
        Ok(*interval)
    }

    /// Forwards an extended-control write to the collaborator
    pub fn set_control(&self, id: u32, value: i32) -> Result<()> {
        self.ops.set_control(id, value)
    }

    /// Forwards an extended-control read to the collaborator
    pub fn get_control(&self, id: u32) -> Result<i32> {
        self.ops.get_control(id)
    }

    /// Forwards an extended-control query to the collaborator
    pub fn query_control(&self, id: u32) -> Result<control::Desc> {
        self.ops.query_control(id)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("caps", &self.caps)
            .field("device_caps", &self.device_caps)
            .finish()
    }
}
