#![allow(dead_code)]

pub mod range_server;

use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use zipfetch::{ByteRange, RangeFetch, Result, ZipFetchError};

pub const STORED: u16 = 0;
pub const DEFLATE: u16 = 8;

struct BuilderEntry {
    name: String,
    data: Vec<u8>,
    method: u16,
    central_extra: Vec<u8>,
}

/// Writes small ZIP archives in memory.
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<BuilderEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: &str, data: &[u8], method: u16) -> Self {
        self.entries.push(BuilderEntry {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            central_extra: Vec::new(),
        });
        self
    }

    /// Entry whose central record carries an extra field the local header lacks.
    pub fn entry_with_central_extra(
        mut self,
        name: &str,
        data: &[u8],
        method: u16,
        extra: &[u8],
    ) -> Self {
        self.entries.push(BuilderEntry {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            central_extra: extra.to_vec(),
        });
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for e in &self.entries {
            let payload = if e.method == DEFLATE {
                deflate(&e.data)
            } else {
                e.data.clone()
            };
            let offset = out.len() as u32;

            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(e.method).unwrap();
            out.write_u16::<LittleEndian>(0x6000).unwrap();
            out.write_u16::<LittleEndian>(0x5221).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(e.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(e.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(e.name.as_bytes());
            out.extend_from_slice(&payload);

            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(0x0314).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(e.method).unwrap();
            central.write_u16::<LittleEndian>(0x6000).unwrap();
            central.write_u16::<LittleEndian>(0x5221).unwrap();
            central.write_u32::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(e.data.len() as u32).unwrap();
            central.write_u16::<LittleEndian>(e.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(e.central_extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.extend_from_slice(e.name.as_bytes());
            central.extend_from_slice(&e.central_extra);
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// In-memory archive source that records every `Range` header it is asked for.
pub struct RecordingFetcher {
    data: Vec<u8>,
    fail_probe: bool,
    delay: Option<Duration>,
    panic_on: Option<usize>,
    probes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    ranges: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            fail_probe: false,
            delay: None,
            panic_on: None,
            probes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// Content-length probe answers with HTTP 404.
    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// Hold every range fetch open for `delay` so that fetches overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic inside the `n`th range fetch (1-based).
    pub fn panic_on_fetch(mut self, n: usize) -> Self {
        self.panic_on = Some(n);
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<String> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl RangeFetch for RecordingFetcher {
    async fn content_length(&self) -> Result<u64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe {
            return Err(ZipFetchError::Status {
                status: 404,
                what: "content length probe".into(),
            });
        }
        Ok(self.data.len() as u64)
    }

    async fn fetch_range(&self, range: ByteRange) -> Result<Vec<u8>> {
        let header = range.header_value();
        let seen = {
            let mut ranges = self.ranges.lock().unwrap();
            ranges.push(header);
            ranges.len()
        };
        if self.panic_on == Some(seen) {
            panic!("range fetch {seen} failed hard");
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.data
            .get(range.start as usize..range.end as usize)
            .map(<[u8]>::to_vec)
            .ok_or(ZipFetchError::ShortRead {
                range: range.header_value(),
                expected: range.len(),
                received: 0,
            })
    }
}

/// Parse `bytes=a-b` back into a half-open range.
pub fn parse_range_header(value: &str) -> ByteRange {
    let bounds = value.strip_prefix("bytes=").expect("bytes unit");
    let (start, end) = bounds.split_once('-').expect("dash");
    ByteRange::new(start.parse().unwrap(), end.parse::<u64>().unwrap() + 1)
}

/// Names of the files in `dir`, sorted.
pub fn dir_listing(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
