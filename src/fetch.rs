//! Fetch collaborator: retrieving torrent payloads by URL
//!
//! Feed polling decides *which* URLs to process; the fetcher only turns a
//! URL into raw bytes. It is a trait so tests and embedders can substitute
//! scripted implementations, and so the caller controls the timeout policy
//! rather than the engine.

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Trait for retrieving raw torrent bytes from a URL
///
/// Implementations should treat timeouts as ordinary failures; the engine
/// maps every fetch error into a per-URL outcome and leaves the ledger row
/// claimed but unfinished.
#[async_trait]
pub trait TorrentFetcher: Send + Sync {
    /// Fetch the raw payload behind `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP fetcher backed by a shared [`reqwest::Client`]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout
    ///
    /// The timeout covers the whole request including body transfer; a
    /// timed-out fetch surfaces as a network error.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TorrentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        // Reject malformed URLs before issuing any request
        let url = Url::parse(url)?;
        let response = self.client.get(url).send().await?.error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
