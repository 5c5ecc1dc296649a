//! Errors for the RLE codec and the CPVS container.

use thiserror::Error;

/// Errors raised while decoding run-length encoded data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RleError {
    /// A command requested zero bytes while strict decoding was requested.
    #[error("zero-length RLE command at input offset {offset}")]
    ZeroLengthCommand { offset: usize },
}

/// Errors raised while reading, writing or decompressing a CPVS container.
#[derive(Debug, Error)]
pub enum CpvsError {
    /// The stream is not a CPVS file or its header is inconsistent.
    #[error("invalid CPVS format: {0}")]
    InvalidFormat(String),

    /// The stream ends before the declared offset table does.
    #[error("truncated CPVS data: {0}")]
    TruncatedData(String),

    /// A room index past the end of the offset table was requested.
    #[error("room {room} out of range, container holds {count} rooms")]
    RoomOutOfRange { room: usize, count: usize },

    #[error(transparent)]
    Rle(#[from] RleError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for CPVS operations.
pub type Result<T> = std::result::Result<T, CpvsError>;
