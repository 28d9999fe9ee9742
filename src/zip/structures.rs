use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Result, ZipFetchError};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
pub const EOCD_MIN_SIZE: usize = 22;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bit 11: filename and comment are UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// Location of the central directory, as read from the EOCD record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub offset: u64,
    pub size: u64,
    pub entry_count: u16,
}

impl DirectoryInfo {
    /// Decode the directory anchor from an EOCD record starting at `data[0]`.
    pub fn from_eocd(data: &[u8]) -> Result<Self> {
        if data.len() < EOCD_MIN_SIZE || &data[0..4] != EOCD_SIGNATURE {
            return Err(ZipFetchError::format("invalid end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[10..]);
        let entry_count = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let offset = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;

        Ok(Self {
            offset,
            size,
            entry_count,
        })
    }
}

/// One central directory record.
///
/// Text fields are decoded with code page 437 whatever the UTF-8 flag says;
/// `raw_file_name` keeps the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileEntry {
    /// Position in the central directory, starting at 0.
    pub index: usize,
    pub signature: u32,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    /// Absolute offset of the local file header.
    pub lfh_offset: u64,
    pub file_name: String,
    pub raw_file_name: Vec<u8>,
    pub extra_field: String,
    pub file_comment: String,
}

impl ZipFileEntry {
    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.file_name.ends_with('/')
    }

    /// Whether the archive writer flagged the name as UTF-8.
    pub fn has_utf8_flag(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }

    /// Final path component of the in-archive name, if it has a usable one.
    pub fn basename(&self) -> Option<&str> {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    }

    /// Local header length assuming it mirrors the central record's lengths.
    pub fn provisional_header_len(&self) -> u64 {
        LFH_SIZE as u64 + self.file_name_length as u64 + self.extra_field_length as u64
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// Fields of a local file header that locate and describe the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub flags: u16,
    pub compression_method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < LFH_SIZE {
            return Err(ZipFetchError::format(format!(
                "local file header truncated: {} bytes",
                data.len()
            )));
        }
        if &data[0..4] != LFH_SIGNATURE {
            return Err(ZipFetchError::format("invalid local file header signature"));
        }

        let mut cursor = Cursor::new(&data[6..LFH_SIZE]);
        let flags = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let compression_method = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _last_mod = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let compressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;

        Ok(Self {
            flags,
            compression_method,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
        })
    }

    /// Offset of the payload relative to the start of the header.
    pub fn data_offset(&self) -> usize {
        LFH_SIZE + self.file_name_length as usize + self.extra_field_length as usize
    }
}

fn truncated(_: std::io::Error) -> ZipFetchError {
    ZipFetchError::format("record truncated")
}
