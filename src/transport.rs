// src/transport.rs

//! Transport abstraction for fetching repository artifacts
//!
//! The loader only ever asks for "the bytes at this URL". Implementations:
//! - [`HttpFetcher`]: HTTP/HTTPS via blocking reqwest, plus `file://` from disk
//! - [`MemoryFetcher`]: canned responses, for pre-fetched metadata and tests
//!
//! Not-found responses are reported as [`TransportError::NotFound`] so the
//! resolver can decide on mirror fallback; every other failure is a
//! different variant and is never retried.

use crate::config::HttpConfig;
use crate::error::{Error, Result, TransportError};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Something that can turn a URL into bytes
pub trait Fetcher: Send + Sync {
    /// Fetch the full body at `url`
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// HTTP fetcher using reqwest, with `file://` support
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a fetcher from explicit settings
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn fetch_file(url: &Url) -> Result<Vec<u8>> {
        let path = url.to_file_path().map_err(|()| TransportError::Request {
            url: url.to_string(),
            message: "not a local path".to_string(),
        })?;

        std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TransportError::NotFound {
                url: url.to_string(),
            }
            .into(),
            _ => TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);

        if url.scheme() == "file" {
            return Self::fetch_file(url);
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(TransportError::NotFound {
                url: url.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let bytes = response.bytes().map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: format!("Failed to read response: {e}"),
        })?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// A canned response held by [`MemoryFetcher`]
#[derive(Debug, Clone)]
enum Canned {
    Body(Vec<u8>),
    Status(u16),
}

/// In-memory fetcher serving fixed responses by exact URL
///
/// Unknown URLs are not-found. Every request is recorded, in order.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`
    pub fn insert(&mut self, url: &str, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.to_string(), Canned::Body(body.into()));
    }

    /// Answer `url` with an HTTP status; 404 and 410 count as not-found
    pub fn insert_status(&mut self, url: &str, status: u16) {
        self.responses.insert(url.to_string(), Canned::Status(status));
    }

    /// Builder form of [`MemoryFetcher::insert`]
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    /// Builder form of [`MemoryFetcher::insert_status`]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.insert_status(url, status);
        self
    }

    /// URLs requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.responses.get(url.as_str()) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(404 | 410)) | None => Err(TransportError::NotFound {
                url: url.to_string(),
            }
            .into()),
            Some(Canned::Status(status)) => Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            }
            .into()),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fetcher() {
        let fetcher = MemoryFetcher::new()
            .with("https://example.com/a", b"alpha".to_vec())
            .with_status("https://example.com/b", 500)
            .with_status("https://example.com/c", 410);

        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("https://example.com/b").unwrap();
        let c = Url::parse("https://example.com/c").unwrap();
        let d = Url::parse("https://example.com/d").unwrap();

        assert_eq!(fetcher.fetch(&a).unwrap(), b"alpha");
        assert!(matches!(
            fetcher.fetch(&b),
            Err(Error::Transport(TransportError::Status { status: 500, .. }))
        ));
        assert!(fetcher.fetch(&c).unwrap_err().is_not_found());
        assert!(fetcher.fetch(&d).unwrap_err().is_not_found());

        assert_eq!(
            fetcher.requests(),
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
                "https://example.com/d",
            ]
        );
    }

    #[test]
    fn test_http_fetcher_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repomd.xml");
        std::fs::write(&path, b"<repomd/>").unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::from_file_path(&path).unwrap();
        assert_eq!(fetcher.fetch(&url).unwrap(), b"<repomd/>");

        let missing = Url::from_file_path(dir.path().join("missing.xml")).unwrap();
        assert!(fetcher.fetch(&missing).unwrap_err().is_not_found());
    }
}
