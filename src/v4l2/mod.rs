//! The command dispatcher: the V4L2-compatible control-plane surface.
//!
//! Commands arrive as a numeric code plus a parameter structure and are
//! translated into device and stream operations. Unknown codes and
//! mismatched parameter structures come back as `InvalidArgument`, never
//! as a panic.

pub mod videodev;
pub mod vidioc;

use std::any::Any;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::{Flags, Type};
use crate::capability::Capabilities;
use crate::control::{self, Type as ControlType};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::fourcc::FourCC;
use crate::fraction::Fraction;
use crate::memory::Memory;
use crate::pool::Pool;

/// Frame-rate capability bit of [`videodev::CaptureParm`]
const CAP_TIMEPERFRAME: u32 = 0x1000;

// The payload locator packs the stream type into the top byte and the
// element index below it.
const fn buf_off(type_: u32, index: u32) -> u32 {
    (type_ << 24) + index
}

const fn buf_off_index(off: u32) -> u32 {
    off & 0x00ff_ffff
}

const fn buf_off_type(off: u32) -> u32 {
    off >> 24
}

/// Control ids the command layer forwards to the hardware collaborator.
const KNOWN_CIDS: &[u32] = &[
    control::cid::JPEG_COMPRESSION_QUALITY,
    control::cid::THREE_A_LOCK,
    control::cid::FLASH_LED_MODE,
    control::cid::VFLIP,
    control::cid::HFLIP,
];

/// Dispatches command `cmd` with its parameter structure on `device`
///
/// # Example
///
/// ```no_run
/// use vcap::v4l2::{self, videodev, vidioc};
/// # fn demo(device: &vcap::Device) -> vcap::Result<()> {
/// let mut caps = videodev::Capability::default();
/// v4l2::ioctl(device, vidioc::VIDIOC_QUERYCAP, &mut caps)?;
/// # Ok(())
/// # }
/// ```
pub fn ioctl(device: &Device, cmd: u32, arg: &mut dyn Any) -> Result<()> {
    match cmd {
        vidioc::VIDIOC_QUERYCAP => querycap(device, downcast(arg)?),
        vidioc::VIDIOC_ENUM_FMT => enum_fmt(device, downcast(arg)?),
        vidioc::VIDIOC_G_FMT => g_fmt(device, downcast(arg)?),
        vidioc::VIDIOC_S_FMT => s_fmt(device, downcast(arg)?),
        vidioc::VIDIOC_TRY_FMT => try_fmt(device, downcast(arg)?),
        vidioc::VIDIOC_REQBUFS => reqbufs(device, downcast(arg)?),
        vidioc::VIDIOC_QUERYBUF => querybuf(device, downcast(arg)?),
        vidioc::VIDIOC_QBUF => qbuf(device, downcast(arg)?),
        vidioc::VIDIOC_DQBUF => dqbuf(device, downcast(arg)?, None),
        vidioc::VIDIOC_STREAMON => streamon(device, downcast(arg)?),
        vidioc::VIDIOC_STREAMOFF => streamoff(device, downcast(arg)?),
        vidioc::VIDIOC_G_PARM => g_parm(device, downcast(arg)?),
        vidioc::VIDIOC_S_PARM => s_parm(device, downcast(arg)?),
        vidioc::VIDIOC_G_EXT_CTRLS => op_ext_ctrls(device, downcast(arg)?, false),
        vidioc::VIDIOC_S_EXT_CTRLS => op_ext_ctrls(device, downcast(arg)?, true),
        vidioc::VIDIOC_QUERY_EXT_CTRL => query_ext_ctrl(device, downcast(arg)?),
        _ => {
            log::debug!("unknown command {:#x}", cmd);
            Err(Error::InvalidArgument)
        }
    }
}

fn downcast<T: 'static>(arg: &mut dyn Any) -> Result<&mut T> {
    arg.downcast_mut::<T>().ok_or(Error::InvalidArgument)
}

fn stream_type(repr: u32) -> Result<Type> {
    Type::try_from(repr).map_err(|_| Error::InvalidArgument)
}

fn check_mmap(memory: u32) -> Result<()> {
    // only pre-mapped shared buffers are supported
    match Memory::try_from(memory) {
        Ok(Memory::Mmap) => Ok(()),
        _ => Err(Error::InvalidArgument),
    }
}

fn write_str(dst: &mut [u8], src: &str) {
    let n = src.len().min(dst.len() - 1);
    dst[..n].copy_from_slice(&src.as_bytes()[..n]);
    dst[n..].fill(0);
}

fn version_code() -> u32 {
    let mut parts = env!("CARGO_PKG_VERSION")
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    (major << 16) | (minor << 8) | patch
}

fn querycap(device: &Device, cap: &mut videodev::Capability) -> Result<()> {
    *cap = videodev::Capability::default();
    write_str(&mut cap.driver, device.name());
    write_str(&mut cap.card, device.name());
    write_str(&mut cap.bus_info, &format!("platform:{}", device.name()));
    cap.version = version_code();
    cap.capabilities = device.capabilities().into();
    if device.capabilities().contains(Capabilities::DEVICE_CAPS) {
        cap.device_caps = device.device_capabilities().into();
    }
    Ok(())
}

fn enum_fmt(device: &Device, desc: &mut videodev::FmtDesc) -> Result<()> {
    let type_ = stream_type(desc.type_)?;
    let found = device.enum_format(type_, desc.index)?;

    desc.flags = 0;
    desc.pixelformat = found.fourcc.into();
    write_str(&mut desc.description, found.description);
    Ok(())
}

fn g_fmt(device: &Device, fmt: &mut videodev::Format) -> Result<()> {
    let type_ = stream_type(fmt.type_)?;
    let format = device.format(type_)?;

    fmt.fmt = videodev::PixFormat::default();
    fmt.fmt.width = format.width;
    fmt.fmt.height = format.height;
    fmt.fmt.pixelformat = format.fourcc.into();
    fmt.fmt.bytesperline = format.width * format.bpp / 8;
    fmt.fmt.sizeimage = format.frame_size();
    Ok(())
}

fn s_fmt(device: &Device, fmt: &mut videodev::Format) -> Result<()> {
    let type_ = stream_type(fmt.type_)?;
    let requested = Format::new(
        fmt.fmt.width,
        fmt.fmt.height,
        FourCC::from(fmt.fmt.pixelformat),
    );
    let applied = device.set_format(type_, &requested)?;

    fmt.fmt.bytesperline = applied.width * applied.bpp / 8;
    fmt.fmt.sizeimage = applied.frame_size();
    Ok(())
}

fn try_fmt(device: &Device, fmt: &mut videodev::Format) -> Result<()> {
    let type_ = stream_type(fmt.type_)?;
    let requested = Format::new(
        fmt.fmt.width,
        fmt.fmt.height,
        FourCC::from(fmt.fmt.pixelformat),
    );
    let adjusted = device.try_format(type_, &requested)?;

    fmt.fmt.bytesperline = adjusted.width * adjusted.bpp / 8;
    fmt.fmt.sizeimage = adjusted.frame_size();
    Ok(())
}

fn reqbufs(device: &Device, req: &mut videodev::RequestBuffers) -> Result<()> {
    check_mmap(req.memory)?;
    if req.count == 0 {
        return Err(Error::InvalidArgument);
    }

    let type_ = stream_type(req.type_)?;
    device.request_buffers(type_, req.count)
}

fn querybuf(device: &Device, buf: &mut videodev::Buffer) -> Result<()> {
    check_mmap(buf.memory)?;

    let type_ = stream_type(buf.type_)?;
    let info = device.buffer_info(type_)?;
    if buf.index >= info.count {
        return Err(Error::InvalidArgument);
    }

    buf.length = info.size;
    buf.offset = buf_off(buf.type_, buf.index);
    buf.flags = Flags::MAPPED.into();
    Ok(())
}

fn qbuf(device: &Device, buf: &mut videodev::Buffer) -> Result<()> {
    check_mmap(buf.memory)?;

    let type_ = stream_type(buf.type_)?;
    let info = device.buffer_info(type_)?;
    if buf.index >= info.count {
        return Err(Error::InvalidArgument);
    }

    device.queue_buffer(type_, buf.index)?;
    buf.flags = (Flags::MAPPED | Flags::QUEUED).into();
    Ok(())
}

/// DQBUF with an explicit wait: `None` blocks until a buffer completes,
/// `Some(Duration::ZERO)` polls.
///
/// The plain [`ioctl`] entry for `VIDIOC_DQBUF` waits forever, matching
/// a blocking file descriptor.
pub fn dqbuf(device: &Device, buf: &mut videodev::Buffer, timeout: Option<Duration>) -> Result<()> {
    check_mmap(buf.memory)?;

    let type_ = stream_type(buf.type_)?;
    let done = device.dequeue_buffer(type_, timeout)?;

    buf.index = done.index;
    buf.bytesused = done.bytesused;
    buf.offset = buf_off(buf.type_, done.index);
    buf.flags = (Flags::MAPPED | Flags::DONE).into();
    Ok(())
}

fn streamon(device: &Device, arg: &mut u32) -> Result<()> {
    let type_ = stream_type(*arg)?;
    device.start(type_)
}

fn streamoff(device: &Device, arg: &mut u32) -> Result<()> {
    let type_ = stream_type(*arg)?;
    device.stop(type_)
}

fn g_parm(device: &Device, parm: &mut videodev::StreamParm) -> Result<()> {
    let type_ = stream_type(parm.type_)?;
    let interval = device.params(type_)?;

    parm.parm = videodev::CaptureParm::default();
    parm.parm.capability = CAP_TIMEPERFRAME;
    parm.parm.timeperframe.numerator = interval.numerator;
    parm.parm.timeperframe.denominator = interval.denominator;
    Ok(())
}

fn s_parm(device: &Device, parm: &mut videodev::StreamParm) -> Result<()> {
    let type_ = stream_type(parm.type_)?;
    let requested = Fraction::new(
        parm.parm.timeperframe.numerator,
        parm.parm.timeperframe.denominator,
    );
    let applied = device.set_params(type_, &requested)?;

    parm.parm.capability = CAP_TIMEPERFRAME;
    parm.parm.timeperframe.numerator = applied.numerator;
    parm.parm.timeperframe.denominator = applied.denominator;
    Ok(())
}

fn op_ext_ctrls(device: &Device, controls: &mut videodev::ExtControls, set: bool) -> Result<()> {
    for i in 0..controls.controls.len() {
        let ctrl = &mut controls.controls[i];

        if !KNOWN_CIDS.contains(&ctrl.id) {
            controls.error_idx = i as u32;
            return Err(Error::Unsupported);
        }

        let result = if set {
            device.set_control(ctrl.id, ctrl.value)
        } else {
            device.get_control(ctrl.id).map(|value| ctrl.value = value)
        };

        if let Err(err) = result {
            controls.error_idx = i as u32;
            return Err(err);
        }
    }
    Ok(())
}

fn query_ext_ctrl(device: &Device, qctrl: &mut videodev::QueryExtCtrl) -> Result<()> {
    if !KNOWN_CIDS.contains(&qctrl.id) {
        return Err(Error::Unsupported);
    }

    let desc = device.query_control(qctrl.id)?;

    qctrl.type_ = desc.typ as u32;
    write_str(&mut qctrl.name, &desc.name);
    qctrl.default_value = desc.default_value;
    match desc.typ {
        ControlType::Menu => {
            qctrl.elem_size = std::mem::size_of::<u32>() as u32;
            qctrl.elems = desc.items.len() as u32;
            qctrl.nr_of_dims = desc.items.len() as u32;
            for (dim, item) in qctrl.dims.iter_mut().zip(desc.items.iter()) {
                *dim = *item as u32;
            }
        }
        ControlType::Bitmask => {
            qctrl.minimum = 0;
            qctrl.maximum = desc.maximum;
            qctrl.step = 1;
            qctrl.elems = 1;
            qctrl.nr_of_dims = 0;
        }
        _ => {
            qctrl.minimum = desc.minimum;
            qctrl.maximum = desc.maximum;
            qctrl.step = desc.step;
            qctrl.elems = 1;
            qctrl.nr_of_dims = 0;
        }
    }
    Ok(())
}

/// Resolves an opaque locator from `QUERYBUF` into the pool handle and
/// element index of the payload it names.
///
/// # Example
///
/// ```no_run
/// # fn demo(device: &vcap::Device, offset: u32) -> vcap::Result<()> {
/// let (pool, index) = vcap::v4l2::resolve_offset(device, offset)?;
/// let payload = pool.map(index)?;
/// println!("{} bytes mapped", payload.len());
/// # Ok(())
/// # }
/// ```
pub fn resolve_offset(device: &Device, offset: u32) -> Result<(Arc<Pool>, u32)> {
    let type_ = stream_type(buf_off_type(offset))?;
    let index = buf_off_index(offset);

    let pool = device.buffer_pool(type_)?;
    if index >= pool.info().count {
        return Err(Error::InvalidArgument);
    }
    Ok((pool, index))
}
