use crate::error::{PcsdlError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Retrieves a URL into a local directory.
///
/// The row pipeline depends only on this trait so tests can substitute a
/// local fetcher; [`HttpFetcher`] is the production implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest_dir`, returning the local path on success.
    /// One attempt per call; the caller decides how to recover.
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Derive a local filename from the last path segment of a URL.
///
/// Query string and fragment are stripped first. URLs with no usable segment
/// get `fallback` instead.
pub fn filename_from_url(url: &str, fallback: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");

    if segment.is_empty() || segment.contains(':') {
        fallback.to_string()
    } else {
        segment.to_string()
    }
}

/// Streaming HTTP fetcher over a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        if url.is_empty() {
            return Err(PcsdlError::Fetch("empty URL".to_string()));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;

        let filename = filename_from_url(url, "download");
        let target = dest_dir.join(filename);

        let mut file = File::create(&target).await?;
        let mut stream = response.bytes_stream();
        let mut total: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            total += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Fetched {} bytes from {} to {}", total, url, target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://media.example.org/talks/video42.mp4", "dl"),
            "video42.mp4"
        );
        assert_eq!(
            filename_from_url("https://media.example.org/captions/p7.srt?token=abc", "dl"),
            "p7.srt"
        );
        assert_eq!(
            filename_from_url("https://media.example.org/files/a.vtt#section", "dl"),
            "a.vtt"
        );
    }

    #[test]
    fn test_filename_from_url_fallback() {
        assert_eq!(filename_from_url("https://media.example.org/", "dl"), "dl");
        assert_eq!(filename_from_url("", "dl"), "dl");
    }

    #[test]
    fn test_filename_trailing_slash() {
        assert_eq!(
            filename_from_url("https://media.example.org/talks/video.mp4/", "dl"),
            "video.mp4"
        );
    }
}
