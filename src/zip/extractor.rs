use flate2::read::DeflateDecoder;
use std::io::Read;
use tracing::debug;

use crate::error::{Result, ZipFetchError};
use crate::io::{ByteRange, RangeFetch};

use super::structures::{CompressionMethod, LocalFileHeader, ZipFileEntry};

/// Byte range covering an entry's local header and compressed payload.
///
/// The header length is taken from the central directory's name and extra
/// lengths; the local copy is only known once these bytes arrive.
pub fn entry_range(entry: &ZipFileEntry, content_length: u64) -> Result<ByteRange> {
    let end = entry
        .lfh_offset
        .checked_add(entry.provisional_header_len())
        .and_then(|end| end.checked_add(entry.compressed_size))
        .filter(|&end| end <= content_length)
        .ok_or_else(|| {
            ZipFetchError::format(format!(
                "entry {} ({}) reaches past the end of the archive ({content_length} bytes)",
                entry.index, entry.file_name
            ))
        })?;
    Ok(ByteRange::new(entry.lfh_offset, end))
}

/// Fetch an entry's compressed payload with a single Range request.
///
/// Sizes come from the central directory; the payload start comes from the
/// local header's own name and extra lengths, which may legitimately differ.
pub async fn fetch_compressed<F: RangeFetch + ?Sized>(
    fetcher: &F,
    entry: &ZipFileEntry,
    content_length: u64,
) -> Result<Vec<u8>> {
    let range = entry_range(entry, content_length)?;
    let mut buf = fetcher.fetch_range(range).await?;

    let header = LocalFileHeader::from_bytes(&buf)?;
    if header.compression_method != entry.compression_method.as_u16() {
        debug!(
            entry = %entry.file_name,
            local = header.compression_method,
            central = entry.compression_method.as_u16(),
            "local header compression method differs from central directory"
        );
    }

    let start = header.data_offset();
    let end = start + entry.compressed_size as usize;
    if end > buf.len() {
        return Err(ZipFetchError::format(format!(
            "local header of {} is {} bytes longer than its central record predicts",
            entry.file_name,
            end - buf.len()
        )));
    }

    buf.truncate(end);
    buf.drain(..start);
    Ok(buf)
}

/// Decompress a payload according to the entry's compression method.
pub fn decompress(entry: &ZipFileEntry, data: Vec<u8>) -> Result<Vec<u8>> {
    match entry.compression_method {
        CompressionMethod::Stored => Ok(data),
        CompressionMethod::Deflate => {
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            DeflateDecoder::new(data.as_slice())
                .read_to_end(&mut out)
                .map_err(|e| {
                    ZipFetchError::format(format!("inflating {} failed: {e}", entry.file_name))
                })?;
            Ok(out)
        }
        CompressionMethod::Unknown(method) => Err(ZipFetchError::UnsupportedCompression(method)),
    }
}
