//! Error types for picreel

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for picreel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for picreel operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A source image could not be opened or decoded
    #[error("Cannot decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output video container could not be created
    #[error("Cannot open video sink {}: {reason}", path.display())]
    SinkOpen { path: PathBuf, reason: String },

    /// The external encoder exited unsuccessfully while muxing audio
    #[error("Muxing failed (exit code {exit_code}): {stderr}")]
    Mux { exit_code: i32, stderr: String },

    /// No usable external encoder binary was found
    #[error("Encoder not found: {0}")]
    EncoderNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl Error {
    pub(crate) fn image_decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::ImageDecode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sink_open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SinkOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Error code for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Invalid input parameter
    InvalidInput = 1,
    /// Image could not be decoded
    ImageDecode = 2,
    /// Output container could not be created
    SinkOpen = 3,
    /// Audio muxing failed
    Mux = 4,
    /// External encoder not found
    EncoderNotFound = 5,
    /// I/O error
    IoError = 6,
    /// Encoding error
    EncodeError = 7,
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidInput(_) => ErrorCode::InvalidInput,
            Error::ImageDecode { .. } => ErrorCode::ImageDecode,
            Error::SinkOpen { .. } => ErrorCode::SinkOpen,
            Error::Mux { .. } => ErrorCode::Mux,
            Error::EncoderNotFound(_) => ErrorCode::EncoderNotFound,
            Error::Io(_) => ErrorCode::IoError,
            Error::Encode(_) => ErrorCode::EncodeError,
        }
    }
}
