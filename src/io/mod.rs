mod http;
mod local;

pub use http::HttpRangeFetcher;
pub use local::LocalFileFetcher;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// Half-open byte range `[start, end)` within the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// HTTP `Range` header value (inclusive end): `bytes=start-(end-1)`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end.saturating_sub(1))
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Random access to the bytes of an archive.
///
/// Implementations must treat every call independently: no per-call state
/// (such as a `Range` header) may live on a shared object, since calls are
/// issued concurrently.
#[async_trait]
pub trait RangeFetch: Send + Sync {
    /// Total size of the archive in bytes.
    async fn content_length(&self) -> Result<u64>;

    /// Fetch exactly the bytes in `range`.
    async fn fetch_range(&self, range: ByteRange) -> Result<Vec<u8>>;
}
