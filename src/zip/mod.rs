//! ZIP archive decoding over Range requests.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP records and constants (EOCD anchor, entries, local headers)
//! - [`eocd`]: widening tail search for the End of Central Directory
//! - [`parser`]: central directory decoding
//! - [`filter`]: regex selection of entries
//! - [`extractor`]: per-entry fetch and decompression
//! - [`archive`]: [`ArchiveHandle`], which ties the above to a fetcher
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading the EOCD first, then the Central Directory, lists the archive
//! without touching the bulk of its bytes.
//!
//! ## Limitations
//!
//! - No ZIP64, encryption or multi-disk support
//! - STORED and DEFLATE only
//! - Names are always decoded as code page 437, even when flagged UTF-8
//! - CRC32 is not verified

mod archive;
mod cp437;
pub mod eocd;
mod extractor;
mod filter;
mod parser;
mod structures;

pub use archive::{ArchiveHandle, CentralDirectory};
pub use eocd::{EocdSearch, SearchStep};
pub use extractor::{decompress, entry_range, fetch_compressed};
pub use filter::EntryFilter;
pub use parser::parse_central_directory;
pub use structures::*;
