//! Numeric command codes of the control surface.
//!
//! The encoding follows the Linux ioctl convention: direction, argument
//! size, the `'V'` type byte and a command number packed into one 32-bit
//! code, so the numbers line up with what V4L2 client code expects.

use std::mem::size_of;

use super::videodev::*;

// linux ioctl.h
const NRBITS: u32 = 8;
const TYPEBITS: u32 = 8;
const SIZEBITS: u32 = 14;

const NRSHIFT: u32 = 0;
const TYPESHIFT: u32 = NRSHIFT + NRBITS;
const SIZESHIFT: u32 = TYPESHIFT + TYPEBITS;
const DIRSHIFT: u32 = SIZESHIFT + SIZEBITS;

const NONE: u32 = 0;
const WRITE: u32 = 1;
const READ: u32 = 2;

const fn ioc(dir: u32, nr: u8, size: usize) -> u32 {
    (dir << DIRSHIFT)
        | ((b'V' as u32) << TYPESHIFT)
        | ((nr as u32) << NRSHIFT)
        | ((size as u32) << SIZESHIFT)
}

const fn io(nr: u8) -> u32 {
    ioc(NONE, nr, 0)
}

const fn ior(nr: u8, size: usize) -> u32 {
    ioc(READ, nr, size)
}

const fn iow(nr: u8, size: usize) -> u32 {
    ioc(WRITE, nr, size)
}

const fn iowr(nr: u8, size: usize) -> u32 {
    ioc(READ | WRITE, nr, size)
}

pub const VIDIOC_QUERYCAP: u32 = ior(0, size_of::<Capability>());
pub const VIDIOC_RESERVED: u32 = io(1);
pub const VIDIOC_ENUM_FMT: u32 = iowr(2, size_of::<FmtDesc>());
pub const VIDIOC_G_FMT: u32 = iowr(4, size_of::<Format>());
pub const VIDIOC_S_FMT: u32 = iowr(5, size_of::<Format>());
pub const VIDIOC_REQBUFS: u32 = iowr(8, size_of::<RequestBuffers>());
pub const VIDIOC_QUERYBUF: u32 = iowr(9, size_of::<Buffer>());
pub const VIDIOC_QBUF: u32 = iowr(15, size_of::<Buffer>());
pub const VIDIOC_DQBUF: u32 = iowr(17, size_of::<Buffer>());
pub const VIDIOC_STREAMON: u32 = iow(18, size_of::<u32>());
pub const VIDIOC_STREAMOFF: u32 = iow(19, size_of::<u32>());
pub const VIDIOC_G_PARM: u32 = iowr(21, size_of::<StreamParm>());
pub const VIDIOC_S_PARM: u32 = iowr(22, size_of::<StreamParm>());
pub const VIDIOC_TRY_FMT: u32 = iowr(64, size_of::<Format>());
pub const VIDIOC_G_EXT_CTRLS: u32 = iowr(71, size_of::<ExtControls>());
pub const VIDIOC_S_EXT_CTRLS: u32 = iowr(72, size_of::<ExtControls>());
pub const VIDIOC_QUERY_EXT_CTRL: u32 = iowr(103, size_of::<QueryExtCtrl>());
