//! # zipfetch
//!
//! Extract a regex-selected handful of files from a very large remote ZIP
//! archive without downloading it.
//!
//! The archive's tail is fetched with HTTP Range requests to find the End of
//! Central Directory, the Central Directory is fetched in one request and
//! decoded, and every matching entry is then fetched with one more Range
//! request of its own, decompressed and written flat into an output
//! directory.
//!
//! ## Features
//!
//! - Widening EOCD search that tolerates archive comments up to 1 KiB by default
//! - STORED and DEFLATE entries
//! - Case-insensitive regex selection over in-archive paths
//! - Concurrent per-entry extraction with atomic file writes
//! - Local archives through the same code path
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let report = zipfetch::extract_files(
//!         "https://example.com/artifact.zip",
//!         Path::new("out"),
//!         r"Internal.*\.dll$",
//!     )
//!     .await?;
//!
//!     for path in &report.written {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod logging;
pub mod zip;

pub use cli::Cli;
pub use config::FetchConfig;
pub use error::{Result, ZipFetchError};
pub use extract::{
    EntryFailure, ExtractionReport, Outcome, extract_files, extract_files_with, extract_matching,
};
pub use io::{ByteRange, HttpRangeFetcher, LocalFileFetcher, RangeFetch};
pub use zip::{ArchiveHandle, EntryFilter, ZipFileEntry};
