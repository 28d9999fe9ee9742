use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::FetchConfig;
use crate::error::{Result, ZipFetchError};
use crate::io::{ByteRange, RangeFetch};

use super::eocd;
use super::extractor::{decompress, fetch_compressed};
use super::parser::parse_central_directory;
use super::structures::{DirectoryInfo, ZipFileEntry};

/// The decoded central directory of an archive.
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    pub info: DirectoryInfo,
    /// Absolute offset of the EOCD record.
    pub eocd_offset: u64,
    /// Entries in central directory order.
    pub entries: Vec<ZipFileEntry>,
}

/// Resolution outcome; an empty cell is the unresolved state.
#[derive(Debug)]
enum DirectoryState {
    Resolved(Arc<CentralDirectory>),
    Failed(Arc<ZipFetchError>),
}

/// A remote archive opened for random access.
///
/// Content length and central directory are resolved at most once per
/// handle, even when many tasks ask for them at the same time. A failed
/// directory resolution is remembered and replayed to later callers.
pub struct ArchiveHandle<F: RangeFetch + ?Sized> {
    fetcher: Arc<F>,
    eocd_chunk_size: u64,
    eocd_max_attempts: u32,
    content_length: OnceCell<u64>,
    directory: OnceCell<DirectoryState>,
}

impl<F: RangeFetch + ?Sized> ArchiveHandle<F> {
    pub fn new(fetcher: Arc<F>, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            eocd_chunk_size: config.eocd_chunk_size,
            eocd_max_attempts: config.eocd_max_attempts,
            content_length: OnceCell::new(),
            directory: OnceCell::new(),
        }
    }

    /// Use a size the caller already knows; the content length probe is skipped.
    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = OnceCell::new_with(Some(content_length));
        self
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Total archive size, probed on first use.
    pub async fn content_length(&self) -> Result<u64> {
        self.content_length
            .get_or_try_init(|| self.fetcher.content_length())
            .await
            .copied()
    }

    /// The central directory, resolved on first use.
    pub async fn directory(&self) -> Result<Arc<CentralDirectory>> {
        let state = self
            .directory
            .get_or_init(|| async {
                match self.resolve_directory().await {
                    Ok(dir) => DirectoryState::Resolved(Arc::new(dir)),
                    Err(e) => DirectoryState::Failed(Arc::new(e)),
                }
            })
            .await;

        match state {
            DirectoryState::Resolved(dir) => Ok(Arc::clone(dir)),
            DirectoryState::Failed(err) => Err(ZipFetchError::Shared(Arc::clone(err))),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        Ok(self.directory().await?.entries.clone())
    }

    /// Extract one entry to memory: one Range fetch, then decompression.
    pub async fn extract(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let raw = self.fetch_compressed(entry).await?;
        decompress(entry, raw)
    }

    /// Fetch one entry's still-compressed payload.
    pub async fn fetch_compressed(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let content_length = self.content_length().await?;
        fetch_compressed(self.fetcher.as_ref(), entry, content_length).await
    }

    async fn resolve_directory(&self) -> Result<CentralDirectory> {
        let content_length = self.content_length().await?;
        let (info, eocd_offset) = eocd::locate(
            self.fetcher.as_ref(),
            content_length,
            self.eocd_chunk_size,
            self.eocd_max_attempts,
        )
        .await?;

        let end = info
            .offset
            .checked_add(info.size)
            .filter(|&end| end <= content_length)
            .ok_or_else(|| {
                ZipFetchError::format(format!(
                    "central directory [{}, +{}) lies outside the archive ({content_length} bytes)",
                    info.offset, info.size
                ))
            })?;

        // Read the entire Central Directory in one request
        let data = self
            .fetcher
            .fetch_range(ByteRange::new(info.offset, end))
            .await?;
        let entries = parse_central_directory(&data, info.entry_count)?;
        info!(
            entries = entries.len(),
            content_length, "resolved archive directory"
        );

        Ok(CentralDirectory {
            info,
            eocd_offset,
            entries,
        })
    }
}
