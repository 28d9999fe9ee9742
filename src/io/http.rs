use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_RANGES, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ByteRange, RangeFetch};
use crate::config::FetchConfig;
use crate::error::{Result, ZipFetchError};

/// HTTP Range fetcher for remote ZIP files.
///
/// The `Client` (and its connection pool) is shared by every call; each
/// fetch builds its own request carrying its own `Range` header.
pub struct HttpRangeFetcher {
    client: Client,
    url: String,
    transferred_bytes: AtomicU64,
}

impl HttpRangeFetcher {
    pub fn new(url: impl Into<String>, config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self::with_client(builder.build()?, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            transferred_bytes: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get total payload bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RangeFetch for HttpRangeFetcher {
    async fn content_length(&self) -> Result<u64> {
        // `send` resolves once headers arrive; the body is dropped unread.
        let resp = self.client.get(&self.url).send().await?;

        if !resp.status().is_success() {
            return Err(ZipFetchError::Status {
                status: resp.status().as_u16(),
                what: "content length probe".into(),
            });
        }

        let accept_ranges = resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        if !accept_ranges.contains("bytes") {
            warn!(url = %self.url, "server does not advertise byte range support");
        }

        let size = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or(ZipFetchError::MissingContentLength)?;

        debug!(url = %self.url, size, "resolved content length");
        Ok(size)
    }

    async fn fetch_range(&self, range: ByteRange) -> Result<Vec<u8>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let header = range.header_value();
        debug!(range = %header, "fetching");

        let resp = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/octet-stream")
            .header(RANGE, &header)
            .send()
            .await?;

        // A 200 means the server ignored the range and is sending the whole file.
        if resp.status() != StatusCode::PARTIAL_CONTENT {
            return Err(ZipFetchError::Status {
                status: resp.status().as_u16(),
                what: format!("range {header}"),
            });
        }

        let bytes = resp.bytes().await?;
        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        if (bytes.len() as u64) < range.len() {
            return Err(ZipFetchError::ShortRead {
                range: header,
                expected: range.len(),
                received: bytes.len() as u64,
            });
        }

        let mut buf = bytes.to_vec();
        buf.truncate(range.len() as usize);
        Ok(buf)
    }
}
