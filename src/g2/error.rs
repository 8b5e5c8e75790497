//! Error types for the G2 download protocol.

use thiserror::Error;

/// Result type alias for G2 operations.
pub type G2Result<T> = Result<T, G2Error>;

/// Coarse classification of a failure, shared by every device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input.
    InvalidArgument,
    /// A buffer could not be grown to the negotiated size.
    OutOfMemory,
    /// Transport failure or short transfer.
    Io,
    /// The device violated the wire protocol.
    Protocol,
    /// The dump contents are structurally corrupt.
    DataFormat,
}

/// Errors that can occur while talking to a G2 or decoding its dump.
#[derive(Debug, Error)]
pub enum G2Error {
    /// Caller supplied an unusable argument.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The dump buffer could not be resized.
    #[error("Insufficient buffer space available ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    /// Standard I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Native HID backend error.
    #[cfg(feature = "hidapi")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// The transport returned fewer bytes than a full packet.
    #[error("Incomplete transfer (got {actual}, expected {expected})")]
    IncompleteTransfer { expected: usize, actual: usize },

    /// The device sent something the protocol does not allow.
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    /// The bulk transfer size disagrees with the negotiated length.
    #[error("Received an unexpected size: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u32 },

    /// A dive record overruns the region claimed by a newer record.
    #[error("Dive record at offset {offset} with length {length} exceeds limit {limit}")]
    DataFormat {
        offset: usize,
        length: usize,
        limit: usize,
    },

    /// No device with the G2 identifiers is attached.
    #[error("No compatible device found")]
    NoDeviceFound,
}

impl G2Error {
    /// Shorthand for an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        G2Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for a protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        G2Error::Protocol {
            reason: reason.into(),
        }
    }

    /// Map this error onto the family-independent classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            G2Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            G2Error::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            G2Error::Io(_) | G2Error::IncompleteTransfer { .. } | G2Error::NoDeviceFound => {
                ErrorKind::Io
            }
            #[cfg(feature = "hidapi")]
            G2Error::Hid(_) => ErrorKind::Io,
            G2Error::Protocol { .. } | G2Error::SizeMismatch { .. } => ErrorKind::Protocol,
            G2Error::DataFormat { .. } => ErrorKind::DataFormat,
        }
    }

    /// Get a user-friendly error code for support purposes.
    pub fn error_code(&self) -> &'static str {
        match self {
            G2Error::InvalidArgument { .. } => "G2-001",
            G2Error::OutOfMemory { .. } => "G2-002",
            G2Error::Io(_) => "G2-010",
            #[cfg(feature = "hidapi")]
            G2Error::Hid(_) => "G2-011",
            G2Error::IncompleteTransfer { .. } => "G2-012",
            G2Error::NoDeviceFound => "G2-013",
            G2Error::Protocol { .. } => "G2-020",
            G2Error::SizeMismatch { .. } => "G2-021",
            G2Error::DataFormat { .. } => "G2-030",
        }
    }
}
