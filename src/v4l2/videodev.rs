//! Fixed-layout parameter structures of the control surface.
//!
//! Field sets and ordering mirror the V4L2 structures of the same name.
//! The extended-controls bridge owns its control array instead of carrying
//! a raw pointer plus count; everything else is a `#[repr(C)]` mirror.

/// QUERYCAP reply
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Capability {
    pub driver: [u8; 16],
    pub card: [u8; 32],
    pub bus_info: [u8; 32],
    pub version: u32,
    pub capabilities: u32,
    pub device_caps: u32,
    pub reserved: [u32; 3],
}

/// Single-planar pixel format
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PixFormat {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub field: u32,
    pub bytesperline: u32,
    pub sizeimage: u32,
    pub colorspace: u32,
    pub flags: u32,
}

/// G_FMT / S_FMT / TRY_FMT argument
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Format {
    /// Stream type the format applies to
    pub type_: u32,
    pub fmt: PixFormat,
}

/// ENUM_FMT argument
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FmtDesc {
    pub index: u32,
    pub type_: u32,
    pub flags: u32,
    pub description: [u8; 32],
    pub pixelformat: u32,
    pub reserved: [u32; 4],
}

/// REQBUFS argument
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestBuffers {
    pub count: u32,
    pub type_: u32,
    pub memory: u32,
    pub reserved: [u32; 2],
}

/// QUERYBUF / QBUF / DQBUF argument.
///
/// `offset` is the opaque locator of the buffer payload for pre-mapped
/// shared access; resolve it with [`super::resolve_offset`].
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Buffer {
    pub index: u32,
    pub type_: u32,
    pub bytesused: u32,
    pub flags: u32,
    pub field: u32,
    pub sequence: u32,
    pub memory: u32,
    pub offset: u32,
    pub length: u32,
    pub reserved: [u32; 2],
}

/// Time-per-frame fraction
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Fract {
    pub numerator: u32,
    pub denominator: u32,
}

/// Capture timing parameters
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct CaptureParm {
    pub capability: u32,
    pub capturemode: u32,
    pub timeperframe: Fract,
    pub extendedmode: u32,
    pub readbuffers: u32,
    pub reserved: [u32; 4],
}

/// G_PARM / S_PARM argument
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamParm {
    pub type_: u32,
    pub parm: CaptureParm,
}

/// One extended control
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtControl {
    pub id: u32,
    pub size: u32,
    pub value: i32,
}

/// G_EXT_CTRLS / S_EXT_CTRLS argument
#[derive(Debug, Default, Clone)]
pub struct ExtControls {
    pub ctrl_class: u32,
    pub error_idx: u32,
    pub controls: Vec<ExtControl>,
}

/// QUERY_EXT_CTRL argument
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryExtCtrl {
    pub id: u32,
    pub type_: u32,
    pub name: [u8; 32],
    pub minimum: i64,
    pub maximum: i64,
    pub step: u64,
    pub default_value: i64,
    pub flags: u32,
    pub elem_size: u32,
    pub elems: u32,
    pub nr_of_dims: u32,
    pub dims: [u32; 4],
}
