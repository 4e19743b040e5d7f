//! End-to-end capture streaming over the command surface.

mod common;

use std::time::{Duration, Instant};

use vcap::buffer::Type;
use vcap::fourcc::pixelformat;
use vcap::v4l2::{self, videodev, vidioc};
use vcap::{Error, Memory};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn set_capture_format(device: &vcap::Device, width: u32, height: u32) -> videodev::Format {
    let mut fmt = videodev::Format::default();
    fmt.type_ = Type::VideoCapture as u32;
    fmt.fmt.width = width;
    fmt.fmt.height = height;
    fmt.fmt.pixelformat = pixelformat::RGB565.into();
    v4l2::ioctl(device, vidioc::VIDIOC_S_FMT, &mut fmt).unwrap();
    fmt
}

fn request_capture_buffers(device: &vcap::Device, count: u32) -> Result<(), Error> {
    let mut req = videodev::RequestBuffers {
        count,
        type_: Type::VideoCapture as u32,
        memory: Memory::Mmap as u32,
        reserved: [0; 2],
    };
    v4l2::ioctl(device, vidioc::VIDIOC_REQBUFS, &mut req)
}

fn queue(device: &vcap::Device, index: u32) {
    let mut buf = videodev::Buffer::default();
    buf.type_ = Type::VideoCapture as u32;
    buf.memory = Memory::Mmap as u32;
    buf.index = index;
    v4l2::ioctl(device, vidioc::VIDIOC_QBUF, &mut buf).unwrap();
}

/// Simulates the capture controller's interrupt path: pull the next
/// queued buffer, fill it, complete it.
fn produce_frame(device: &vcap::Device, fill: u8, len: u32) {
    let mut element = device.take_queued(Type::VideoCapture).unwrap();
    element.with_data_mut(|data| {
        for byte in data[..len as usize].iter_mut() {
            *byte = fill;
        }
    });
    element.complete(len);
}

#[test]
fn capture_round_trip_preserves_order() {
    init_logging();
    let (device, state, _registry) = common::open_sim_sensor("sim0");

    // 64x64 at 16 bits per pixel: 8192 byte frames
    let fmt = set_capture_format(&device, 64, 64);
    assert_eq!(fmt.fmt.sizeimage, 8192);

    request_capture_buffers(&device, 2).unwrap();

    queue(&device, 0);
    queue(&device, 1);

    let mut type_ = Type::VideoCapture as u32;
    v4l2::ioctl(&device, vidioc::VIDIOC_STREAMON, &mut type_).unwrap();
    assert_eq!(state.start_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    produce_frame(&device, 0xaa, 8192);
    produce_frame(&device, 0xbb, 8192);

    let mut buf = videodev::Buffer::default();
    buf.type_ = Type::VideoCapture as u32;
    buf.memory = Memory::Mmap as u32;

    v4l2::dqbuf(&device, &mut buf, Some(Duration::from_secs(1))).unwrap();
    assert_eq!(buf.index, 0);
    assert_eq!(buf.bytesused, 8192);

    // the payload is reachable through the locator without a copy
    let (pool, index) = v4l2::resolve_offset(&device, buf.offset).unwrap();
    assert_eq!(index, 0);
    assert!(pool.map(index).unwrap().iter().all(|&b| b == 0xaa));

    v4l2::dqbuf(&device, &mut buf, Some(Duration::from_secs(1))).unwrap();
    assert_eq!(buf.index, 1);

    v4l2::ioctl(&device, vidioc::VIDIOC_STREAMOFF, &mut type_).unwrap();
    assert!(!state.running.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn order_holds_across_stream_cycles() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim1");

    set_capture_format(&device, 32, 32);
    request_capture_buffers(&device, 3).unwrap();

    let mut type_ = Type::VideoCapture as u32;
    for _ in 0..3 {
        for index in 0..3 {
            queue(&device, index);
        }
        v4l2::ioctl(&device, vidioc::VIDIOC_STREAMON, &mut type_).unwrap();

        for _ in 0..3 {
            produce_frame(&device, 0x55, 2048);
        }
        for expected in 0..3 {
            let mut buf = videodev::Buffer::default();
            buf.type_ = Type::VideoCapture as u32;
            buf.memory = Memory::Mmap as u32;
            v4l2::dqbuf(&device, &mut buf, Some(Duration::from_secs(1))).unwrap();
            assert_eq!(buf.index, expected);
        }

        v4l2::ioctl(&device, vidioc::VIDIOC_STREAMOFF, &mut type_).unwrap();
    }
}

#[test]
fn dequeue_with_zero_timeout_polls() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim2");

    set_capture_format(&device, 32, 32);
    request_capture_buffers(&device, 1).unwrap();
    queue(&device, 0);

    let mut buf = videodev::Buffer::default();
    buf.type_ = Type::VideoCapture as u32;
    buf.memory = Memory::Mmap as u32;

    let begin = Instant::now();
    let err = v4l2::dqbuf(&device, &mut buf, Some(Duration::ZERO)).err();
    assert_eq!(err, Some(Error::Timeout));
    assert!(begin.elapsed() < Duration::from_millis(50));

    // timing out consumed nothing
    produce_frame(&device, 0x01, 64);
    v4l2::dqbuf(&device, &mut buf, Some(Duration::ZERO)).unwrap();
    assert_eq!(buf.index, 0);
}

#[test]
fn zero_buffer_request_leaves_pool_intact() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim3");

    set_capture_format(&device, 32, 32);
    request_capture_buffers(&device, 2).unwrap();

    assert_eq!(request_capture_buffers(&device, 0).err(), Some(Error::InvalidArgument));

    // previous pool still present and usable
    let info = device.buffer_info(Type::VideoCapture).unwrap();
    assert_eq!(info.count, 2);
    queue(&device, 0);
    queue(&device, 1);
}

#[test]
fn commands_out_of_order_are_rejected() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim4");

    // buffers before format
    assert_eq!(request_capture_buffers(&device, 2).err(), Some(Error::InvalidState));

    // stream on before buffers
    let mut type_ = Type::VideoCapture as u32;
    let err = v4l2::ioctl(&device, vidioc::VIDIOC_STREAMON, &mut type_).err();
    assert_eq!(err, Some(Error::InvalidState));

    // wrong direction for a capture-only device
    let mut out_type = Type::VideoOutput as u32;
    let err = v4l2::ioctl(&device, vidioc::VIDIOC_STREAMON, &mut out_type).err();
    assert_eq!(err, Some(Error::InvalidArgument));

    // queue out of range
    set_capture_format(&device, 32, 32);
    request_capture_buffers(&device, 2).unwrap();
    let mut buf = videodev::Buffer::default();
    buf.type_ = Type::VideoCapture as u32;
    buf.memory = Memory::Mmap as u32;
    buf.index = 2;
    let err = v4l2::ioctl(&device, vidioc::VIDIOC_QBUF, &mut buf).err();
    assert_eq!(err, Some(Error::InvalidArgument));
}

#[test]
fn enum_fmt_walks_the_sensor_formats() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim5");

    let mut desc = videodev::FmtDesc::default();
    desc.type_ = Type::VideoCapture as u32;
    desc.index = 0;
    v4l2::ioctl(&device, vidioc::VIDIOC_ENUM_FMT, &mut desc).unwrap();
    assert_eq!(vcap::FourCC::from(desc.pixelformat), pixelformat::GREY);

    desc.index = 1;
    v4l2::ioctl(&device, vidioc::VIDIOC_ENUM_FMT, &mut desc).unwrap();
    assert_eq!(desc.pixelformat, u32::from(pixelformat::RGB565));
    assert!(desc.description.starts_with(b"RGB 5-6-5"));

    desc.index = 2;
    let err = v4l2::ioctl(&device, vidioc::VIDIOC_ENUM_FMT, &mut desc).err();
    assert_eq!(err, Some(Error::InvalidArgument));
}

#[test]
fn frame_interval_round_trip() {
    init_logging();
    let (device, _state, _registry) = common::open_sim_sensor("sim6");

    set_capture_format(&device, 32, 32);

    let mut parm = videodev::StreamParm::default();
    parm.type_ = Type::VideoCapture as u32;
    parm.parm.timeperframe = videodev::Fract {
        numerator: 1,
        denominator: 30,
    };
    v4l2::ioctl(&device, vidioc::VIDIOC_S_PARM, &mut parm).unwrap();

    let mut read_back = videodev::StreamParm::default();
    read_back.type_ = Type::VideoCapture as u32;
    v4l2::ioctl(&device, vidioc::VIDIOC_G_PARM, &mut read_back).unwrap();
    assert_eq!(read_back.parm.timeperframe.numerator, 1);
    assert_eq!(read_back.parm.timeperframe.denominator, 30);

    // fractional rates are not representable
    parm.parm.timeperframe.numerator = 2;
    let err = v4l2::ioctl(&device, vidioc::VIDIOC_S_PARM, &mut parm).err();
    assert_eq!(err, Some(Error::InvalidArgument));
}

#[test]
fn close_tears_down_and_reopen_resets() {
    init_logging();
    let (device, state, registry) = common::open_sim_sensor("sim7");

    set_capture_format(&device, 32, 32);
    request_capture_buffers(&device, 2).unwrap();
    queue(&device, 0);

    device.close().unwrap();
    assert_eq!(state.deinit_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    // reopening resets all stream state
    let device = registry.open("sim7").unwrap();
    assert_eq!(state.init_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(device.format(Type::VideoCapture).err(), Some(Error::InvalidState));
    assert_eq!(
        request_capture_buffers(&device, 2).err(),
        Some(Error::InvalidState)
    );
}
