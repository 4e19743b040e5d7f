use std::convert::TryFrom;
use std::fmt;

use bitflags::bitflags;

/// Memory used for buffer exchange
///
/// Only pre-mapped shared buffers ([`Memory::Mmap`]) are accepted by the
/// command layer; the other modes exist so foreign requests can be decoded
/// and rejected cleanly.
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memory {
    Mmap        = 1,
    UserPtr     = 2,
    Overlay     = 3,
    DmaBuf      = 4,
}

impl TryFrom<u32> for Memory {
    type Error = ();

    fn try_from(repr: u32) -> Result<Self, Self::Error> {
        match repr {
            1 => Ok(Memory::Mmap),
            2 => Ok(Memory::UserPtr),
            3 => Ok(Memory::Overlay),
            4 => Ok(Memory::DmaBuf),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Memory::Mmap => write!(f, "memory-mapped"),
            Memory::UserPtr => write!(f, "user pointer"),
            Memory::Overlay => write!(f, "overlay"),
            Memory::DmaBuf => write!(f, "DMA buffered"),
        }
    }
}

bitflags! {
    /// Allocation capability flags for pool payload memory.
    ///
    /// The hardware collaborator states what kind of memory its transfers
    /// need when it computes the buffer requirements for a format.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemFlags: u32 {
        /// Byte-addressable memory
        const BYTE_ACCESS   = 0x0004;
        /// Memory a DMA engine can reach
        const DMA           = 0x0008;
        /// External (off-chip) RAM is acceptable
        const SPIRAM        = 0x0400;
        /// Internal RAM only
        const INTERNAL      = 0x0800;
    }
}

impl From<u32> for MemFlags {
    fn from(flags: u32) -> Self {
        Self::from_bits_retain(flags)
    }
}

impl From<MemFlags> for u32 {
    fn from(flags: MemFlags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for MemFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
