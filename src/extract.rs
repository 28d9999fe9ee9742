//! Extraction orchestration: resolve the directory once, filter, then fetch
//! and write every matching entry concurrently.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::{Result, ZipFetchError};
use crate::io::{HttpRangeFetcher, RangeFetch};
use crate::zip::{ArchiveHandle, EntryFilter, ZipFileEntry, decompress};

/// An entry that could not be extracted.
#[derive(Debug)]
pub struct EntryFailure {
    pub file_name: String,
    pub error: ZipFetchError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    Partial { failed: usize },
}

/// What an extraction run did. Archive-level failures are returned as
/// errors instead, with nothing written.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Entries that matched the pattern, directories included.
    pub matched: usize,
    /// Paths written, in completion order.
    pub written: Vec<PathBuf>,
    /// Matching directory entries, which have no content to write.
    pub skipped: Vec<String>,
    pub failed: Vec<EntryFailure>,
}

impl ExtractionReport {
    pub fn outcome(&self) -> Outcome {
        if self.failed.is_empty() {
            Outcome::Complete
        } else {
            Outcome::Partial {
                failed: self.failed.len(),
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome() == Outcome::Complete
    }
}

/// Extract every entry of the archive at `url` whose path matches `pattern`
/// (case-insensitive) into `output_dir`, flattening directories.
pub async fn extract_files(url: &str, output_dir: &Path, pattern: &str) -> Result<ExtractionReport> {
    extract_files_with(url, output_dir, pattern, &FetchConfig::default()).await
}

pub async fn extract_files_with(
    url: &str,
    output_dir: &Path,
    pattern: &str,
    config: &FetchConfig,
) -> Result<ExtractionReport> {
    let fetcher = Arc::new(HttpRangeFetcher::new(url, config)?);
    let handle = Arc::new(ArchiveHandle::new(fetcher, config));
    extract_matching(handle, output_dir, pattern, config).await
}

/// Extract matching entries from an already opened archive.
///
/// Each entry is fetched with its own Range request and written through a
/// temp file in `output_dir` that is renamed into place only once complete.
/// Dropping the returned future aborts pending fetches; unfinished temp
/// files are removed.
pub async fn extract_matching<F>(
    handle: Arc<ArchiveHandle<F>>,
    output_dir: &Path,
    pattern: &str,
    config: &FetchConfig,
) -> Result<ExtractionReport>
where
    F: RangeFetch + ?Sized + 'static,
{
    let filter = EntryFilter::new(pattern)?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ZipFetchError::io(output_dir, e))?;

    let directory = handle.directory().await?;
    let matches = filter.apply(&directory.entries);

    let mut report = ExtractionReport {
        matched: matches.len(),
        ..Default::default()
    };
    debug!(
        pattern,
        matched = matches.len(),
        total = directory.entries.len(),
        "filtered entries"
    );

    let limit = Arc::new(Semaphore::new(config.max_concurrent_entries.max(1)));
    let mut tasks = JoinSet::new();
    let mut names = HashMap::new();

    for entry in matches {
        if entry.is_directory() {
            report.skipped.push(entry.file_name.clone());
            continue;
        }
        let Some(basename) = entry.basename() else {
            report.failed.push(EntryFailure {
                file_name: entry.file_name.clone(),
                error: ZipFetchError::format("entry has no usable file name"),
            });
            continue;
        };

        let target = output_dir.join(basename);
        let dir = output_dir.to_path_buf();
        let file_name = entry.file_name.clone();
        let entry = entry.clone();
        let handle = Arc::clone(&handle);
        let limit = Arc::clone(&limit);

        let task = tasks.spawn(async move {
            extract_one(&handle, &limit, &entry, dir, target).await
        });
        names.insert(task.id(), file_name);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, Ok(path))) => {
                let file_name = names.remove(&id).unwrap_or_default();
                info!(entry = %file_name, path = %path.display(), "extracted");
                report.written.push(path);
            }
            Ok((id, Err(error))) => {
                let file_name = names.remove(&id).unwrap_or_default();
                warn!(entry = %file_name, %error, "extraction failed");
                report.failed.push(EntryFailure { file_name, error });
            }
            Err(join_err) => {
                let file_name = names.remove(&join_err.id()).unwrap_or_default();
                warn!(entry = %file_name, error = %join_err, "extraction task did not finish");
                report.failed.push(EntryFailure {
                    file_name,
                    error: ZipFetchError::Source(std::io::Error::other(join_err.to_string())),
                });
            }
        }
    }

    Ok(report)
}

async fn extract_one<F>(
    handle: &ArchiveHandle<F>,
    limit: &Semaphore,
    entry: &ZipFileEntry,
    dir: PathBuf,
    target: PathBuf,
) -> Result<PathBuf>
where
    F: RangeFetch + ?Sized,
{
    let raw = {
        // The permit only bounds network concurrency.
        let _permit = limit
            .acquire()
            .await
            .map_err(|e| ZipFetchError::Source(std::io::Error::other(e)))?;
        handle.fetch_compressed(entry).await?
    };

    let entry = entry.clone();
    let blocking_target = target.clone();
    tokio::task::spawn_blocking(move || write_entry(&entry, raw, &dir, &blocking_target))
        .await
        .map_err(|e| ZipFetchError::io(&target, std::io::Error::other(e)))??;

    Ok(target)
}

/// Decompress and write through a temp file, renamed over `target` on success.
fn write_entry(entry: &ZipFileEntry, raw: Vec<u8>, dir: &Path, target: &Path) -> Result<()> {
    let data = decompress(entry, raw)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".zipfetch-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| ZipFetchError::io(dir, e))?;
    tmp.write_all(&data)
        .map_err(|e| ZipFetchError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| ZipFetchError::io(target, e.error))?;
    Ok(())
}
