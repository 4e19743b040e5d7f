use std::fmt;

/// Control data type
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Type {
    Integer         = 1,
    Boolean         = 2,
    Menu            = 3,
    Bitmask         = 8,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Well-known control ids, values per the V4L2 control namespace.
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
pub mod cid {
    /// Horizontal mirror
    pub const HFLIP: u32                    = 0x00980914;
    /// Vertical flip
    pub const VFLIP: u32                    = 0x00980915;
    /// Auto exposure / white balance / focus lock
    pub const THREE_A_LOCK: u32             = 0x009a091b;
    /// Flash LED mode
    pub const FLASH_LED_MODE: u32           = 0x009c0901;
    /// JPEG compression quality
    pub const JPEG_COMPRESSION_QUALITY: u32 = 0x009d0903;
}

/// Extracts the control class from a control id
pub fn class(id: u32) -> u32 {
    id & 0x0fff_0000
}

/// Control classes the command layer recognizes.
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
pub mod class_id {
    pub const USER: u32     = 0x00980000;
    pub const CODEC: u32    = 0x00990000;
    pub const CAMERA: u32   = 0x009a0000;
    pub const FLASH: u32    = 0x009c0000;
    pub const JPEG: u32     = 0x009d0000;
}

/// Control descriptor as reported by the hardware collaborator
#[derive(Debug, Clone)]
pub struct Desc {
    pub id: u32,
    pub typ: Type,
    pub name: String,
    pub minimum: i64,
    pub maximum: i64,
    pub step: u64,
    pub default_value: i64,
    /// Menu entries, empty unless `typ` is [`Type::Menu`]
    pub items: Vec<i64>,
}

impl fmt::Display for Desc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) : [{}, {}] step {} default {}",
            self.name, self.typ, self.minimum, self.maximum, self.step, self.default_value
        )
    }
}
