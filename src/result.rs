//! Error types that can be emitted from this library
//!
//! Two failure channels are kept apart on purpose. Decoding a structure at a position that
//! doesn't hold one (wrong signature, not enough bytes) is reported as `None` by the decoders
//! and never reaches this module. Failing to move bytes in or out of the underlying store is a
//! [`ZipError`].

use displaydoc::Display;
use std::borrow::Cow;
use thiserror::Error;

use std::error::Error;
use std::fmt;
use std::io;
use std::num::TryFromIntError;

/// Generic result type with ZipError as its error variant
pub type ZipResult<T> = Result<T, ZipError>;

/// Error type for Zip
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ZipError {
    /// file is unreadable: {0}
    UnreadableFile(#[source] io::Error),

    /// file is unwritable after {written} bytes: {source}
    UnwritableFile {
        /// Bytes that reached the store before the failure.
        written: u64,
        source: io::Error,
    },

    /// invalid Zip archive: {0}
    InvalidArchive(Cow<'static, str>),

    /// unsupported Zip archive: {0}
    UnsupportedArchive(Cow<'static, str>),
}

impl ZipError {
    pub(crate) fn short_read(expected: usize, read: usize) -> Self {
        ZipError::UnreadableFile(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {expected} bytes, got {read}"),
        ))
    }

    pub(crate) fn short_write(expected: usize, written: u64) -> Self {
        ZipError::UnwritableFile {
            written,
            source: io::Error::new(
                io::ErrorKind::WriteZero,
                format!("expected to write {expected} bytes, wrote {written}"),
            ),
        }
    }

    /// Bytes written before the failure, when this is a write failure.
    pub fn bytes_written(&self) -> Option<u64> {
        match self {
            ZipError::UnwritableFile { written, .. } => Some(*written),
            _ => None,
        }
    }
}

pub(crate) fn invalid_archive<T, M: Into<Cow<'static, str>>>(message: M) -> ZipResult<T> {
    Err(ZipError::InvalidArchive(message.into()))
}

macro_rules! invalid {
    ($fmt_string:literal) => {
        {
            return crate::result::invalid_archive($fmt_string).into();
        }
    };
}
pub(crate) use invalid;

impl From<ZipError> for io::Error {
    fn from(err: ZipError) -> io::Error {
        let kind = match &err {
            ZipError::UnreadableFile(err) => err.kind(),
            ZipError::UnwritableFile { source, .. } => source.kind(),
            ZipError::InvalidArchive(_) => io::ErrorKind::InvalidData,
            ZipError::UnsupportedArchive(_) => io::ErrorKind::Unsupported,
        };

        io::Error::new(kind, err)
    }
}

/// Error type for time parsing
#[derive(Debug)]
pub struct DateTimeRangeError;

// TryFromIntError is also an out-of-range error.
impl From<TryFromIntError> for DateTimeRangeError {
    fn from(_value: TryFromIntError) -> Self {
        DateTimeRangeError
    }
}

impl fmt::Display for DateTimeRangeError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "a date could not be represented within the bounds the MS-DOS date range (1980-2107)"
        )
    }
}

impl Error for DateTimeRangeError {}
