use std::sync::Arc;

use crate::buffer::{BufferInfo, Type};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::pool::Pool;

/// One direction of a device's data flow.
///
/// A stream walks `unconfigured -> format set -> buffered -> streaming`;
/// stopping returns it to `buffered`. Buffers may be re-requested while
/// buffered, and the format can only change before buffers exist.
#[derive(Debug)]
pub struct Stream {
    direction: Type,
    format: Option<Format>,
    buf_info: BufferInfo,
    pool: Option<Arc<Pool>>,
    started: bool,
}

impl Stream {
    pub(crate) fn new(direction: Type) -> Self {
        Stream {
            direction,
            format: None,
            buf_info: BufferInfo::default(),
            pool: None,
            started: false,
        }
    }

    /// Stream direction
    pub fn direction(&self) -> Type {
        self.direction
    }

    /// Currently configured format
    pub fn format(&self) -> Result<Format> {
        self.format.ok_or(Error::InvalidState)
    }

    /// Buffer geometry as computed by the last successful set-format plus
    /// the requested count
    pub fn buffer_info(&self) -> BufferInfo {
        self.buf_info
    }

    /// Whether the stream has been started and not yet stopped
    pub fn is_streaming(&self) -> bool {
        self.started
    }

    pub(crate) fn pool(&self) -> Result<&Arc<Pool>> {
        self.pool.as_ref().ok_or(Error::InvalidState)
    }

    /// Stores a validated format and the buffer requirements the hardware
    /// collaborator derived from it.
    ///
    /// Rejected while streaming, and while a pool of an incompatible
    /// element size exists; the caller must stop and re-request buffers
    /// first.
    pub(crate) fn accept_format(&mut self, format: Format, requirements: BufferInfo) -> Result<()> {
        if self.started {
            return Err(Error::InvalidState);
        }
        if let Some(pool) = &self.pool {
            if pool.info().size != requirements.size {
                return Err(Error::InvalidState);
            }
        }

        self.format = Some(format);
        self.buf_info.size = requirements.size;
        self.buf_info.align = requirements.align;
        self.buf_info.caps = requirements.caps;
        Ok(())
    }

    /// Replaces the stream's pool with a freshly allocated one of `count`
    /// elements.
    ///
    /// Requires a configured format and a stopped stream. On failure the
    /// previous pool is left intact.
    pub(crate) fn request_buffers(&mut self, count: u32) -> Result<()> {
        if count == 0 {
            return Err(Error::InvalidArgument);
        }
        if self.started {
            return Err(Error::InvalidState);
        }
        if self.format.is_none() || !self.buf_info.is_configured() {
            log::error!(
                "buffer request without format: size={} align={} caps={}",
                self.buf_info.size,
                self.buf_info.align,
                self.buf_info.caps
            );
            return Err(Error::InvalidState);
        }

        let info = BufferInfo {
            count,
            ..self.buf_info
        };
        let pool = Pool::new(info)?;

        // the stream is stopped, so nothing is checked out to hardware
        if let Some(old) = &self.pool {
            old.reclaim()?;
        }
        if let Some(old) = self.pool.take() {
            old.destroy()?;
        }
        self.buf_info.count = count;
        self.pool = Some(pool);
        Ok(())
    }

    /// Drops the stream's pool after draining it back to free.
    pub(crate) fn release_buffers(&mut self) -> Result<()> {
        if let Some(pool) = &self.pool {
            pool.reclaim()?;
        }
        if let Some(pool) = self.pool.take() {
            pool.destroy()?;
        }
        self.buf_info.count = 0;
        Ok(())
    }

    pub(crate) fn mark_started(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::InvalidState);
        }
        if self.pool.is_none() {
            return Err(Error::InvalidState);
        }
        self.started = true;
        Ok(())
    }

    pub(crate) fn mark_stopped(&mut self) -> Result<()> {
        if !self.started {
            return Err(Error::InvalidState);
        }
        self.started = false;
        Ok(())
    }

    /// Resets the stream to its unconfigured state on device open.
    pub(crate) fn reset(&mut self) {
        self.format = None;
        self.buf_info = BufferInfo::default();
        self.pool = None;
        self.started = false;
    }
}
