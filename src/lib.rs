//! Hardware-agnostic video capture core.
//!
//! This crate is the buffer lifecycle manager and streaming control state
//! machine of an embedded capture stack: a process-wide device registry,
//! per-stream buffer pools, a V4L2-compatible command dispatcher and the
//! memory-to-memory trigger protocol used by codec-style devices.
//!
//! Hardware-specific components (sensor programming, capture controllers,
//! codecs) plug in through the [`HardwareOps`] trait: the core tells them
//! when to start, stop and reconfigure, and they hand filled buffers back
//! through pool element handles, typically from interrupt context. No
//! pixel data is copied on the hot path; applications reach the payloads
//! through pre-mapped shared buffers addressed by index.

pub mod v4l2;

pub mod buffer;

mod capability;
pub use capability::Capabilities;

pub mod control;

mod device;
pub use device::{Device, Event, HardwareOps};

mod error;
pub use error::{Error, Result};

pub mod format;
pub use format::Format;

pub mod fourcc;
pub use fourcc::FourCC;

mod fraction;
pub use fraction::Fraction;

mod m2m;

mod memory;
pub use memory::{MemFlags, Memory};

pub mod pool;
pub use pool::{Dequeued, Element, Pool};

mod registry;
pub use registry::Registry;

mod stream;
pub use stream::Stream;
