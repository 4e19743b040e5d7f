//! Crate-wide error taxonomy (spec §7).
//!
//! One typed error enum for every fallible operation in the crate and a
//! `Result` alias defaulting to it. Internal list-consistency violations
//! panic rather than surfacing here (spec §7); every variant below is a
//! recoverable condition returned to the caller.

use thiserror::Error;

/// Errors returned by the capture core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad index, bad mode, or bad command argument.
    #[error("invalid argument")]
    InvalidArgument,

    /// Allocation failure during pool or device creation.
    #[error("out of memory")]
    NoMemory,

    /// Operation attempted in the wrong stream state.
    #[error("invalid state")]
    InvalidState,

    /// Unknown device name.
    #[error("not found")]
    NotFound,

    /// A hardware collaborator hook returned an error.
    #[error("hardware failure")]
    Hardware,

    /// A blocking dequeue exceeded its wait.
    #[error("timed out")]
    Timeout,

    /// Missing hook or unknown control (original `ESP_ERR_NOT_SUPPORTED`).
    #[error("unsupported")]
    Unsupported,
}

/// Result specialized to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
