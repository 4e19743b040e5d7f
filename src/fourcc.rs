use std::{fmt, str};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
/// Four character code representing a pixelformat
pub struct FourCC {
    pub repr: [u8; 4],
}

impl FourCC {
    /// Returns a pixelformat as four character code
    ///
    /// # Arguments
    ///
    /// * `repr` - Four characters as raw bytes
    ///
    /// # Example
    ///
    /// ```
    /// use vcap::FourCC;
    /// let fourcc = FourCC::new(b"RGBP");
    /// ```
    pub const fn new(repr: &[u8; 4]) -> FourCC {
        FourCC { repr: *repr }
    }

    /// Returns the string representation of a four character code
    pub fn str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.repr)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(string) = str::from_utf8(&self.repr) {
            write!(f, "{}", string)?;
        }
        Ok(())
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC::new(&code.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        Self::from_le_bytes(fourcc.repr)
    }
}

/// Pixel-format codes understood by the core's format description table.
///
/// Values are the standard V4L2 four character codes.
pub mod pixelformat {
    use super::FourCC;

    /// 8-bit Bayer BGGR
    pub const SBGGR8: FourCC = FourCC::new(b"BA81");
    /// 16-bit RGB 5-6-5
    pub const RGB565: FourCC = FourCC::new(b"RGBP");
    /// 24-bit RGB 8-8-8
    pub const RGB24: FourCC = FourCC::new(b"RGB3");
    /// Planar YUV 4:2:0
    pub const YUV420: FourCC = FourCC::new(b"YU12");
    /// Planar YUV 4:2:2
    pub const YUV422P: FourCC = FourCC::new(b"422P");
    /// 8-bit greyscale
    pub const GREY: FourCC = FourCC::new(b"GREY");
    /// JFIF JPEG
    pub const JPEG: FourCC = FourCC::new(b"JPEG");
}
