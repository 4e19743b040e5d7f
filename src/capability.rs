use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Device capability flags, bit-compatible with the V4L2 capability mask.
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Single-direction video capture device
        const VIDEO_CAPTURE     = 0x00000001;
        /// Single-direction video output device
        const VIDEO_OUTPUT      = 0x00000002;
        /// Memory-to-memory device with both a capture and an output stream
        const VIDEO_M2M         = 0x00008000;
        /// Extended pixel format support
        const EXT_PIX_FORMAT    = 0x00200000;
        /// read()/write() style I/O
        const READ_WRITE        = 0x01000000;
        /// Streaming I/O (queue/dequeue)
        const STREAMING         = 0x04000000;
        /// The device-capability sub-mask is valid
        const DEVICE_CAPS       = 0x80000000;
    }
}

impl From<u32> for Capabilities {
    fn from(caps: u32) -> Self {
        Self::from_bits_retain(caps)
    }
}

impl From<Capabilities> for u32 {
    fn from(caps: Capabilities) -> Self {
        caps.bits()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
