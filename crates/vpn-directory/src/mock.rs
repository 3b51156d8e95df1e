// ============================================
// File: crates/vpn-directory/src/mock.rs
// ============================================
//! # Mock Directory Source
//!
//! ## Creation Reason
//! Scripted feed responses for fetcher and engine tests, no network needed.
//!
//! ## Usage in Tests
//! ```
//! use vpn_directory::mock::MockSource;
//! use vpn_directory::DirectorySource;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = MockSource::new();
//! source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");
//!
//! let body = source.fetch_text("http://feed.test/").await.unwrap();
//! assert!(body.contains("Germany"));
//! assert_eq!(source.requests(), vec!["http://feed.test/".to_string()]);
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - For tests only
//! - An empty script answers with an `Http` error
//!
//! ## Last Modified
//! v0.1.0 - Initial mock source

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{DirectoryError, Result};
use crate::source::DirectorySource;

/// One scripted answer.
#[derive(Debug)]
enum Scripted {
    Body(String),
    Error(DirectoryError),
}

/// Mock source returning queued bodies or errors in order.
#[derive(Debug, Default)]
pub struct MockSource {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSource {
    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful body.
    pub fn push_body(&self, body: impl Into<String>) {
        self.script.lock().push_back(Scripted::Body(body.into()));
    }

    /// Queues a failure.
    pub fn push_error(&self, err: DirectoryError) {
        self.script.lock().push_back(Scripted::Error(err));
    }

    /// Makes every request sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DirectorySource for MockSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.lock().push(url.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.lock().pop_front() {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Error(err)) => Err(err),
            None => Err(DirectoryError::http(url, "mock script exhausted")),
        }
    }
}
