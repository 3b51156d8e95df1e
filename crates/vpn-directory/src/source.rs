// ============================================
// File: crates/vpn-directory/src/source.rs
// ============================================
//! # Directory Sources
//!
//! ## Creation Reason
//! Separates "get the feed text" from parsing and caching so the fetcher
//! can be tested without a network.
//!
//! ## Main Functionality
//! - `DirectorySource`: Async trait returning the raw feed body
//! - `HttpSource`: reqwest-backed source with a request timeout
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be `Send + Sync`
//! - Return the body as-is, all tolerance lives in the parser
//!
//! ## Last Modified
//! v0.1.0 - Initial source abstraction

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{DirectoryError, Result};

/// Default public feed endpoint.
pub const DEFAULT_SOURCE_URL: &str = "http://www.vpngate.net/api/iphone/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================
// DirectorySource Trait
// ============================================

/// Anything that can produce a directory feed body.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetches the feed body from `url`.
    ///
    /// # Errors
    /// Returns a fetch error (`Http`, `Status`, `Timeout`) on failure.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

// ============================================
// HttpSource
// ============================================

/// HTTP GET source.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
    timeout_secs: u64,
}

impl HttpSource {
    /// Creates a source whose requests give up after `timeout_secs`.
    ///
    /// # Errors
    /// Returns `Http` if the TLS backend cannot be initialized.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("vpn-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::http("<client>", e.to_string()))?;
        Ok(Self { http, timeout_secs })
    }

    /// Configured timeout.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn map_error(&self, url: &str, err: &reqwest::Error) -> DirectoryError {
        if err.is_timeout() {
            DirectoryError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            DirectoryError::http(url, err.to_string())
        }
    }
}

#[async_trait]
impl DirectorySource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Requesting directory feed");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(url, &e))?;
        debug!(url = %url, bytes = body.len(), "Directory feed received");
        Ok(body)
    }
}
