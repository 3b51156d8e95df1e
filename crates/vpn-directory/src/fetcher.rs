// ============================================
// File: crates/vpn-directory/src/fetcher.rs
// ============================================
//! # Directory Fetcher
//!
//! ## Creation Reason
//! Glues source, parser and cache into the "refresh the directory"
//! operation.
//!
//! ## Main Functionality
//! - `fetch`: Download, parse, write through to cache, return records
//! - `fetch_or_empty`: Same, but any failure degrades to an empty list
//! - `fetch_until`: Same as `fetch`, abandoned on shutdown signal
//!
//! ## Flow
//! ```text
//! source.fetch_text(url) ──► parse_directory ──► cache.save ──► records
//!        │ error                                     │ error
//!        └──────────── cache untouched ◄─────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The cache is written only after a successful download, even when
//!   zero lines parsed
//! - A failed or cancelled fetch must never touch the cache
//!
//! ## Last Modified
//! v0.1.0 - Initial fetcher

use std::io;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache::DirectoryCache;
use crate::error::{DirectoryError, Result};
use crate::parser::parse_directory;
use crate::record::DirectoryRecord;
use crate::source::DirectorySource;

// ============================================
// DirectoryFetcher
// ============================================

/// Refreshes the directory from a source into a cache.
pub struct DirectoryFetcher {
    source: Arc<dyn DirectorySource>,
    cache: DirectoryCache,
}

impl DirectoryFetcher {
    /// Creates a fetcher.
    pub fn new(source: Arc<dyn DirectorySource>, cache: DirectoryCache) -> Self {
        Self { source, cache }
    }

    /// Cache written by this fetcher.
    #[must_use]
    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Downloads and parses the feed, then replaces the cache.
    ///
    /// # Errors
    /// - Fetch errors from the source (cache untouched)
    /// - `Io` if the cache could not be written
    pub async fn fetch(&self, url: &str) -> Result<Vec<DirectoryRecord>> {
        let body = self.source.fetch_text(url).await?;
        self.store(url, &body).await
    }

    /// Parses a downloaded body and writes it through to the cache.
    async fn store(&self, url: &str, body: &str) -> Result<Vec<DirectoryRecord>> {
        let outcome = parse_directory(body);

        info!(
            url = %url,
            accepted = outcome.records.len(),
            malformed = outcome.malformed,
            truncated = outcome.truncated,
            "Directory feed parsed"
        );

        // File I/O and fsync stay off the async workers.
        let cache = self.cache.clone();
        let records = outcome.records;
        tokio::task::spawn_blocking(move || cache.save(&records).map(|()| records))
            .await
            .map_err(|e| DirectoryError::io("directory cache writer", io::Error::other(e)))?
    }

    /// Like [`fetch`](Self::fetch), returning an empty list on any failure.
    pub async fn fetch_or_empty(&self, url: &str) -> Vec<DirectoryRecord> {
        match self.fetch(url).await {
            Ok(records) => records,
            Err(e) => {
                warn!(url = %url, error = %e, retryable = e.is_retryable(), "Directory fetch failed");
                Vec::new()
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but gives up when `shutdown` fires
    /// during the download. Once the body is in, the cache write completes.
    ///
    /// # Errors
    /// Returns `Cancelled` if the signal arrives first.
    pub async fn fetch_until(
        &self,
        url: &str,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<Vec<DirectoryRecord>> {
        let body = tokio::select! {
            biased;

            _ = shutdown.recv() => {
                info!(url = %url, "Directory fetch cancelled");
                return Err(DirectoryError::Cancelled);
            }
            body = self.source.fetch_text(url) => body?,
        };
        self.store(url, &body).await
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_CACHE_FILE;
    use crate::mock::MockSource;
    use crate::source::HttpSource;
    use std::time::Duration;
    use vpn_common::ServerId;

    const URL: &str = "http://feed.test/api/";

    fn setup() -> (tempfile::TempDir, Arc<MockSource>, DirectoryFetcher) {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockSource::new());
        let cache = DirectoryCache::with_candidates(vec![dir.path().join(DEFAULT_CACHE_FILE)]);
        let fetcher = DirectoryFetcher::new(source.clone(), cache);
        (dir, source, fetcher)
    }

    fn seed_cache(fetcher: &DirectoryFetcher) -> Vec<DirectoryRecord> {
        let prior = vec![DirectoryRecord::new(
            ServerId::parse("7.7.7.7").unwrap(),
            "Prior (7 Mbps)",
            "7.7.7.7",
            "Public",
        )];
        fetcher.cache().save(&prior).unwrap();
        prior
    }

    #[tokio::test]
    async fn test_fetch_caps_and_writes_cache() {
        let (_dir, source, fetcher) = setup();
        source.push_body(vec!["host,1.2.3.4,0,0,5000000,Germany,DE,x"; 15].join("\n"));

        let records = fetcher.fetch(URL).await.unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.name() == "Germany (5 Mbps)"));

        assert_eq!(fetcher.cache().load(), records);
        assert_eq!(source.requests(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let (_dir, source, fetcher) = setup();
        let prior = seed_cache(&fetcher);
        source.push_error(DirectoryError::http(URL, "connection refused"));

        assert!(fetcher.fetch_or_empty(URL).await.is_empty());
        assert_eq!(fetcher.cache().load(), prior);
    }

    #[tokio::test]
    async fn test_bad_status_leaves_cache_untouched() {
        let (_dir, source, fetcher) = setup();
        let prior = seed_cache(&fetcher);
        source.push_error(DirectoryError::Status {
            url: URL.into(),
            status: 503,
        });

        let err = fetcher.fetch(URL).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status { status: 503, .. }));
        assert_eq!(fetcher.cache().load(), prior);
    }

    #[tokio::test]
    async fn test_unreachable_http_source() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirectoryCache::with_candidates(vec![dir.path().join(DEFAULT_CACHE_FILE)]);
        let fetcher = DirectoryFetcher::new(Arc::new(HttpSource::new(2).unwrap()), cache);
        let prior = seed_cache(&fetcher);

        assert!(fetcher.fetch_or_empty("http://127.0.0.1:1/").await.is_empty());
        assert_eq!(fetcher.cache().load(), prior);
    }

    #[tokio::test]
    async fn test_empty_parse_still_replaces_cache() {
        let (_dir, source, fetcher) = setup();
        seed_cache(&fetcher);
        source.push_body("*vpn_servers\n#HostName,IP\n*\n");

        assert!(fetcher.fetch(URL).await.unwrap().is_empty());
        assert!(fetcher.cache().load().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cache_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let source = Arc::new(MockSource::new());
        let cache = DirectoryCache::with_candidates(vec![blocker.join(DEFAULT_CACHE_FILE)]);
        let fetcher = DirectoryFetcher::new(source.clone(), cache);
        source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");

        let err = fetcher.fetch(URL).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Io { .. }));

        source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");
        assert!(fetcher.fetch_or_empty(URL).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_until_cancelled() {
        let (_dir, source, fetcher) = setup();
        let prior = seed_cache(&fetcher);
        source.set_delay(Duration::from_secs(30));
        source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");

        let (tx, mut rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let err = fetcher.fetch_until(URL, &mut rx).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Cancelled));
        assert_eq!(fetcher.cache().load(), prior);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_until_completes_without_signal() {
        let (_dir, source, fetcher) = setup();
        source.set_delay(Duration::from_millis(200));
        source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");

        let (_tx, mut rx) = broadcast::channel::<()>(1);
        let records = fetcher.fetch_until(URL, &mut rx).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
