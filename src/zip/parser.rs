//! Central directory decoding.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) near the file's end
//! 2. Fetch the whole Central Directory in one Range request
//! 3. Walk its records in physical order
//!
//! Each record is a fixed 46-byte header followed by the file name, extra
//! field and comment, in that order.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Cursor, Read};

use crate::error::{Result, ZipFetchError};

use super::cp437;
use super::structures::*;

/// Decode `entry_count` central directory records from `data`.
///
/// Any record whose declared lengths reach past the end of `data` is a
/// format error; nothing is read out of bounds.
pub fn parse_central_directory(data: &[u8], entry_count: u16) -> Result<Vec<ZipFileEntry>> {
    let mut entries = Vec::with_capacity(entry_count as usize);
    let mut cursor = Cursor::new(data);

    for index in 0..entry_count as usize {
        let start = cursor.position();
        let entry = parse_cdfh(&mut cursor, index)?;
        debug_assert_eq!(
            cursor.position() - start,
            CDFH_MIN_SIZE as u64
                + entry.file_name_length as u64
                + entry.extra_field_length as u64
                + entry.file_comment_length as u64
        );
        entries.push(entry);
    }

    Ok(entries)
}

/// Parse one Central Directory File Header at the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>, index: usize) -> Result<ZipFileEntry> {
    let data = *cursor.get_ref();
    let at = cursor.position();
    let header = usize::try_from(at)
        .ok()
        .and_then(|start| data.get(start..start.checked_add(CDFH_MIN_SIZE)?))
        .ok_or_else(|| {
            ZipFetchError::format(format!(
                "central directory entry {index} at offset {at} is truncated"
            ))
        })?;

    // Verify the signature (PK\x01\x02)
    if &header[0..4] != CDFH_SIGNATURE {
        return Err(ZipFetchError::format(format!(
            "central directory entry {index} at offset {at} has a bad signature"
        )));
    }

    let u16_at = |off: usize| LittleEndian::read_u16(&header[off..off + 2]);
    let u32_at = |off: usize| LittleEndian::read_u32(&header[off..off + 4]);

    let file_name_length = u16_at(28);
    let extra_field_length = u16_at(30);
    let file_comment_length = u16_at(32);

    // Variable-length trailer: name, extra field, comment
    cursor.set_position(at + CDFH_MIN_SIZE as u64);
    let raw_file_name = read_field(cursor, file_name_length, index, at)?;
    let extra_field = read_field(cursor, extra_field_length, index, at)?;
    let file_comment = read_field(cursor, file_comment_length, index, at)?;

    Ok(ZipFileEntry {
        index,
        signature: u32_at(0),
        version_made_by: u16_at(4),
        version_needed: u16_at(6),
        flags: u16_at(8),
        compression_method: CompressionMethod::from_u16(u16_at(10)),
        last_mod_time: u16_at(12),
        last_mod_date: u16_at(14),
        crc32: u32_at(16),
        compressed_size: u32_at(20) as u64,
        uncompressed_size: u32_at(24) as u64,
        file_name_length,
        extra_field_length,
        file_comment_length,
        disk_number: u16_at(34),
        internal_attrs: u16_at(36),
        external_attrs: u32_at(38),
        lfh_offset: u32_at(42) as u64,
        file_name: cp437::decode(&raw_file_name),
        raw_file_name,
        extra_field: cp437::decode(&extra_field),
        file_comment: cp437::decode(&file_comment),
    })
}

fn read_field(cursor: &mut Cursor<&[u8]>, len: u16, index: usize, at: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf).map_err(|_| overrun(index, at))?;
    Ok(buf)
}

fn overrun(index: usize, at: u64) -> ZipFetchError {
    ZipFetchError::format(format!(
        "central directory entry {index} at offset {at} extends past the directory"
    ))
}
