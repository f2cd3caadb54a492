//! Image server access.

use std::time::Duration;

use async_trait::async_trait;

/// Issues GET requests against the image server.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches `url` to completion and returns the HTTP status code.
    async fn fetch(&self, url: &str) -> anyhow::Result<u16>;
}

/// `ImageFetcher` backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Every request is aborted after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<u16> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        // The body is part of the timed work
        let body = response.bytes().await?;
        tracing::debug!(url, status, bytes = body.len(), "image fetched");
        Ok(status)
    }
}
