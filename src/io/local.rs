use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{ByteRange, RangeFetch};
use crate::error::{Result, ZipFetchError};

/// Local file fetcher with positional reads.
///
/// Reads run on the blocking pool so callers can treat a local archive the
/// same way as a remote one.
pub struct LocalFileFetcher {
    file: Arc<std::fs::File>,
    size: u64,
}

impl LocalFileFetcher {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| ZipFetchError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| ZipFetchError::io(path, e))?
            .len();
        Ok(Self {
            file: Arc::new(file),
            size,
        })
    }
}

#[async_trait]
impl RangeFetch for LocalFileFetcher {
    async fn content_length(&self) -> Result<u64> {
        Ok(self.size)
    }

    async fn fetch_range(&self, range: ByteRange) -> Result<Vec<u8>> {
        if range.end > self.size {
            return Err(ZipFetchError::ShortRead {
                range: range.header_value(),
                expected: range.len(),
                received: self.size.saturating_sub(range.start),
            });
        }

        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; range.len() as usize];
            read_exact_at(&file, &mut buf, range.start)?;
            Ok::<_, std::io::Error>(buf)
        })
        .await
        .map_err(|e| ZipFetchError::Source(std::io::Error::other(e)))?
        .map_err(ZipFetchError::Source)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &std::fs::File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset)? {
            0 => return Err(std::io::ErrorKind::UnexpectedEof.into()),
            n => {
                buf = &mut std::mem::take(&mut buf)[n..];
                offset += n as u64;
            }
        }
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn read_exact_at(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::io::{Read, Seek, SeekFrom};
    let mut file = file;
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)
}
