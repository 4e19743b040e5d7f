use std::fmt;

use crate::fourcc::{pixelformat, FourCC};

/// Streaming format for one direction of a device
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Format {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// pixelformat code
    pub fourcc: FourCC,
    /// bits per pixel
    pub bpp: u32,
    /// frame rate in frames per second
    pub fps: u32,
}

impl Format {
    /// Returns a format description with the pixel depth taken from the
    /// pixel-format table
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `fourcc` - Four character code (pixelformat)
    ///
    /// # Example
    ///
    /// ```
    /// use vcap::{Format, fourcc::pixelformat};
    /// let fmt = Format::new(640, 480, pixelformat::RGB565);
    /// ```
    pub fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        Format {
            width,
            height,
            fourcc,
            bpp: bits_per_pixel(fourcc).unwrap_or(0),
            fps: 0,
        }
    }

    /// Maximum number of bytes required to store one frame
    pub fn frame_size(&self) -> u32 {
        self.width * self.height * self.bpp / 8
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "width          : {}", self.width)?;
        writeln!(f, "height         : {}", self.height)?;
        writeln!(f, "fourcc         : {}", self.fourcc)?;
        writeln!(f, "bpp            : {}", self.bpp)?;
        writeln!(f, "fps            : {}", self.fps)?;
        Ok(())
    }
}

/// Pixel-format description, describes how a pixelformat stores image data
#[derive(Debug, Copy, Clone)]
pub struct Description {
    pub fourcc: FourCC,
    pub description: &'static str,
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.fourcc, self.description)
    }
}

const DESCRIPTIONS: &[Description] = &[
    Description {
        fourcc: pixelformat::SBGGR8,
        description: "RAW8 BGGR",
    },
    Description {
        fourcc: pixelformat::RGB565,
        description: "RGB 5-6-5",
    },
    Description {
        fourcc: pixelformat::RGB24,
        description: "RGB 8-8-8",
    },
    Description {
        fourcc: pixelformat::YUV420,
        description: "YUV 4:2:0",
    },
    Description {
        fourcc: pixelformat::YUV422P,
        description: "YUV 4:2:2 planar",
    },
    Description {
        fourcc: pixelformat::GREY,
        description: "8-bit greyscale",
    },
    Description {
        fourcc: pixelformat::JPEG,
        description: "JFIF JPEG",
    },
];

/// Returns the description string for a pixelformat, if it is one the core
/// understands
pub fn describe(fourcc: FourCC) -> Option<&'static str> {
    DESCRIPTIONS
        .iter()
        .find(|desc| desc.fourcc == fourcc)
        .map(|desc| desc.description)
}

/// Bits per pixel for a pixelformat.
///
/// Compressed formats report the depth used to size their worst-case
/// buffer, not a true per-pixel figure.
pub fn bits_per_pixel(fourcc: FourCC) -> Option<u32> {
    match fourcc {
        pixelformat::SBGGR8 | pixelformat::GREY => Some(8),
        pixelformat::RGB565 | pixelformat::YUV422P => Some(16),
        pixelformat::RGB24 => Some(24),
        pixelformat::YUV420 => Some(12),
        pixelformat::JPEG => Some(8),
        _ => None,
    }
}
