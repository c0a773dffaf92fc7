//! Error types for filer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for filer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by user-supplied decoders and encoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while reading or writing through filer.
#[derive(Debug, Error)]
pub enum Error {
    /// The host filesystem failed (missing file, permission denied, ...).
    #[error("io error on {}: {source}", .path.display())]
    Io {
        /// Path of the file being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A registered decoder rejected the file contents.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        /// Path of the file being read.
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A registered encoder rejected the data to write.
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        /// Path of the file being written.
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Structured contents reached the filesystem without an encoder.
    #[error("cannot write structured value to {} without an encoder", .path.display())]
    Unwritable {
        /// Path of the file being written.
        path: PathBuf,
    },

    /// Unknown character encoding name.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Unknown open flag.
    #[error("invalid flag: {0}")]
    InvalidFlag(String),

    /// File mode that is neither a number nor an octal string.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Data that cannot be represented in the requested form.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a host filesystem error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap a decoder failure with the path being read.
    pub fn decode(path: impl AsRef<Path>, source: BoxError) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap an encoder failure with the path being written.
    pub fn encode(path: impl AsRef<Path>, source: BoxError) -> Self {
        Self::Encode {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The underlying I/O error kind, when this is a filesystem failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
