use std::convert::TryFrom;
use std::fmt;

use bitflags::bitflags;

use crate::memory::MemFlags;

/// Buffer type
///
/// Selects one direction of a device's data flow. A plain capture or output
/// device has a single stream; a memory-to-memory device has both.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    VideoCapture = 1,
    VideoOutput = 2,
}

impl TryFrom<u32> for Type {
    type Error = ();

    fn try_from(repr: u32) -> Result<Self, Self::Error> {
        match repr {
            1 => Ok(Type::VideoCapture),
            2 => Ok(Type::VideoOutput),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Type::VideoCapture => write!(f, "video capture"),
            Type::VideoOutput => write!(f, "video output"),
        }
    }
}

bitflags! {
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Buffer is mapped
        const MAPPED    = 0x00000001;
        /// Buffer is queued for processing
        const QUEUED    = 0x00000002;
        /// Buffer is ready
        const DONE      = 0x00000004;
        /// Buffer is ready, but the data contained within is corrupted
        const ERROR     = 0x00000040;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Flags {
        Flags::from_bits_retain(flags)
    }
}

impl From<Flags> for u32 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pool geometry: element count plus per-element size, alignment and
/// allocation capabilities.
///
/// Size, alignment and capabilities are computed by the hardware
/// collaborator when a format is set; the count arrives with the
/// request-buffers command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    /// Number of elements in the pool
    pub count: u32,
    /// Usable size of each element in bytes
    pub size: u32,
    /// Payload alignment in bytes
    pub align: u32,
    /// Memory the payloads must be allocated from
    pub caps: MemFlags,
}

impl BufferInfo {
    /// Whether the size/align/caps triple has been populated by a
    /// successful set-format
    pub fn is_configured(&self) -> bool {
        self.size != 0 && self.align != 0 && !self.caps.is_empty()
    }
}
