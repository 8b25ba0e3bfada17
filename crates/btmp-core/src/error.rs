//! Error and status types for btmp.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Every error collapses onto one of the
//! two wire-visible failure [`Status`] codes reported back to the host.

use std::fmt;

/// The error type for all btmp operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed, missing, out-of-range, or miscounted command tokens.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The device rejected an operation or returned a non-success status.
    #[error("device error: {0}")]
    Device(String),

    /// Timed out waiting for the device to answer.
    ///
    /// Raised by device implementations when an expected HCI event never
    /// arrives; the engine treats it as an ordinary device failure.
    #[error("timeout waiting for device")]
    Timeout,

    /// An underlying I/O error (transport or config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The wire status code this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidParameter(_) => Status::ParameterError,
            Error::Device(_) | Error::Timeout | Error::Io(_) => Status::DeviceError,
        }
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result code carried by every response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation completed.
    Success,
    /// The device or transport call failed.
    DeviceError,
    /// The command text was rejected before touching the device.
    ParameterError,
}

impl Status {
    /// Numeric code as it appears on the wire.
    pub const fn code(self) -> u8 {
        match self {
            Status::Success => 0x00,
            Status::DeviceError => 0x01,
            Status::ParameterError => 0x02,
        }
    }

    /// Map an operation outcome onto its status code.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    /// Status codes are rendered as bare lowercase hex (`0`, `1`, `2`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.code())
    }
}
