use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 10;
const RETRY_STEP: Duration = Duration::from_millis(500);

/// Remote archive read through HTTP Range requests.
///
/// Listing an archive only touches its tail and central directory, so a
/// remote archive is listed without fetching the compressed file data.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Check `url` with a HEAD request.
    ///
    /// Fails if the server does not advertise byte ranges or omits
    /// `Content-Length`.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ziptree/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HEAD {} failed with status {}", url, resp.status());
        }
        let size = remote_size(resp.headers())?;
        debug!("Remote archive {} is {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Bytes received from the server so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// One ranged GET, retried on timeouts and connection failures.
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let range = format!("bytes={}-{}", start, end);
        let mut attempt = 0;

        loop {
            let error = match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    match resp.bytes().await {
                        Ok(bytes) => return Ok(bytes.to_vec()),
                        Err(e) => e,
                    }
                }
                Ok(resp) => bail!(
                    "GET {} ({}) failed with status {}",
                    self.url,
                    range,
                    resp.status()
                ),
                Err(e) => e,
            };

            if !(error.is_timeout() || error.is_connect() || error.is_body()) {
                return Err(error.into());
            }
            attempt += 1;
            if attempt >= MAX_RETRIES {
                bail!("Giving up on {} after {} attempts: {}", range, attempt, error);
            }
            warn!("Range {} failed, retry {}/{}: {}", range, attempt, MAX_RETRIES, error);
            tokio::time::sleep(RETRY_STEP * attempt).await;
        }
    }
}

/// Archive size from HEAD response headers, if ranged reads are possible.
fn remote_size(headers: &HeaderMap) -> Result<u64> {
    let accept_ranges = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    if !accept_ranges.split(',').any(|unit| unit.trim() == "bytes") {
        bail!("Remote server does not support Range requests");
    }

    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;
        let mut received = 0;

        // Servers may answer with a shorter range than requested.
        while received < wanted {
            let bytes = self.fetch(offset + received as u64, end).await?;
            if bytes.is_empty() {
                bail!("Server returned an empty range at offset {}", offset + received as u64);
            }
            let n = bytes.len().min(wanted - received);
            buf[received..received + n].copy_from_slice(&bytes[..n]);
            received += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(reqwest::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn size_needs_byte_ranges_and_length() {
        let ok = headers(&[(ACCEPT_RANGES, "bytes"), (CONTENT_LENGTH, "1234")]);
        assert_eq!(remote_size(&ok).unwrap(), 1234);

        let no_ranges = headers(&[(CONTENT_LENGTH, "1234")]);
        assert!(remote_size(&no_ranges).is_err());

        let disabled = headers(&[(ACCEPT_RANGES, "none"), (CONTENT_LENGTH, "1")]);
        assert!(remote_size(&disabled).is_err());

        let no_length = headers(&[(ACCEPT_RANGES, "bytes")]);
        assert!(remote_size(&no_length).is_err());
    }
}
