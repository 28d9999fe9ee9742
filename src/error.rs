//! Error type shared by the fetch, decode and extraction layers.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while reading a remote (or local) ZIP archive.
///
/// Variants fall into four groups: transport failures while fetching bytes,
/// format failures while decoding them, unsupported compression, and local
/// I/O failures while writing output.
#[derive(Debug, Error)]
pub enum ZipFetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP request for {what} failed with status {status}")]
    Status { status: u16, what: String },

    #[error("server did not return a Content-Length")]
    MissingContentLength,

    #[error("short read for {range}: expected {expected} bytes, got {received}")]
    ShortRead {
        range: String,
        expected: u64,
        received: u64,
    },

    #[error("reading archive source failed: {0}")]
    Source(#[source] std::io::Error),

    #[error("end of central directory not found after {attempts} attempt(s)")]
    EocdNotFound { attempts: u32 },

    #[error("malformed archive: {0}")]
    Format(String),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A directory resolution failure cached on the handle and replayed.
    #[error(transparent)]
    Shared(Arc<ZipFetchError>),
}

impl ZipFetchError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ZipFetchError::Format(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ZipFetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures while fetching bytes from the archive source.
    pub fn is_transport(&self) -> bool {
        match self {
            ZipFetchError::Request(_)
            | ZipFetchError::Status { .. }
            | ZipFetchError::MissingContentLength
            | ZipFetchError::ShortRead { .. }
            | ZipFetchError::Source(_) => true,
            ZipFetchError::Shared(inner) => inner.is_transport(),
            _ => false,
        }
    }

    /// True when the fetched bytes do not decode as a supported ZIP layout.
    pub fn is_format(&self) -> bool {
        match self {
            ZipFetchError::EocdNotFound { .. } | ZipFetchError::Format(_) => true,
            ZipFetchError::Shared(inner) => inner.is_format(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZipFetchError>;
