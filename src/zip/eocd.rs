//! Locating the End of Central Directory record.
//!
//! The EOCD sits at the very end of the archive, followed by a comment of
//! unknown length. Rather than fetching the 64 KiB worst case, the search
//! fetches a small tail window and widens it by one chunk per attempt:
//!
//! ```text
//! attempt k: [len - 22 - chunk * k, len)
//! ```
//!
//! [`EocdSearch`] holds the attempt counter and window bounds so that the
//! widening and termination rules can be driven without any I/O.

use tracing::debug;

use super::structures::{DirectoryInfo, EOCD_MIN_SIZE, EOCD_SIGNATURE};
use crate::error::{Result, ZipFetchError};
use crate::io::{ByteRange, RangeFetch};

pub const DEFAULT_CHUNK_SIZE: u64 = 256;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Where the search stands after feeding it a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    Found { info: DirectoryInfo, eocd_offset: u64 },
    /// Not in this window; fetch the next one.
    Widen(ByteRange),
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct EocdSearch {
    content_length: u64,
    chunk_size: u64,
    max_attempts: u32,
    attempt: u32,
}

impl EocdSearch {
    pub fn new(content_length: u64, chunk_size: u64, max_attempts: u32) -> Self {
        Self {
            content_length,
            chunk_size,
            max_attempts,
            attempt: 0,
        }
    }

    /// Attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// The first window, or `Exhausted` when the archive cannot hold an EOCD.
    pub fn start(&mut self) -> SearchStep {
        self.advance()
    }

    /// Scan the window returned by the previous step.
    ///
    /// `buf` must hold exactly the bytes of that window.
    pub fn feed(&mut self, buf: &[u8]) -> SearchStep {
        let window = self.window(self.attempt);
        if let Some(pos) = scan_backward(buf) {
            // A signature inside the search area always has 22 bytes after it.
            if let Ok(info) = DirectoryInfo::from_eocd(&buf[pos..]) {
                return SearchStep::Found {
                    info,
                    eocd_offset: window.start + pos as u64,
                };
            }
        }
        if window.start == 0 {
            // The whole archive was scanned; widening cannot help.
            return SearchStep::Exhausted {
                attempts: self.attempt,
            };
        }
        self.advance()
    }

    fn advance(&mut self) -> SearchStep {
        if self.content_length < EOCD_MIN_SIZE as u64 || self.attempt >= self.max_attempts {
            return SearchStep::Exhausted {
                attempts: self.attempt,
            };
        }
        self.attempt += 1;
        SearchStep::Widen(self.window(self.attempt))
    }

    fn window(&self, attempt: u32) -> ByteRange {
        let reach = EOCD_MIN_SIZE as u64 + self.chunk_size.saturating_mul(attempt as u64);
        ByteRange::new(
            self.content_length.saturating_sub(reach),
            self.content_length,
        )
    }
}

/// Position of the last EOCD signature that leaves room for a full record.
fn scan_backward(buf: &[u8]) -> Option<usize> {
    let last = buf.len().checked_sub(EOCD_MIN_SIZE)?;
    (0..=last).rev().find(|&pos| &buf[pos..pos + 4] == EOCD_SIGNATURE)
}

/// Run the search against a fetcher. Returns the directory anchor and the
/// EOCD's absolute offset.
pub async fn locate<F: RangeFetch + ?Sized>(
    fetcher: &F,
    content_length: u64,
    chunk_size: u64,
    max_attempts: u32,
) -> Result<(DirectoryInfo, u64)> {
    let mut search = EocdSearch::new(content_length, chunk_size, max_attempts);
    let mut step = search.start();
    loop {
        match step {
            SearchStep::Found { info, eocd_offset } => {
                debug!(
                    attempts = search.attempts(),
                    eocd_offset,
                    cd_offset = info.offset,
                    cd_size = info.size,
                    entries = info.entry_count,
                    "located end of central directory"
                );
                return Ok((info, eocd_offset));
            }
            SearchStep::Widen(window) => {
                let buf = fetcher.fetch_range(window).await?;
                step = search.feed(&buf);
            }
            SearchStep::Exhausted { attempts } => {
                return Err(ZipFetchError::EocdNotFound { attempts });
            }
        }
    }
}
