// ============================================
// File: crates/vpn-directory/src/error.rs
// ============================================
//! # Directory Error Types
//!
//! ## Creation Reason
//! Gives every directory failure a typed cause. The engine still degrades
//! these to an empty list or the placeholder record for CLI output, but the
//! cause is kept for logging and for callers that want it.
//!
//! ## Main Functionality
//! - `DirectoryError`: Primary error enum for fetch and cache operations
//! - `is_retryable`: whether a later fetch might succeed
//!
//! ## Error Categories
//! 1. **Fetch Errors**: HTTP transport failures, bad status, timeout, cancel
//! 2. **Cache Errors**: Missing file, unparseable file, write failures
//!
//! ## ⚠️ Important Note for Next Developer
//! - URLs in messages come from config, never from the feed
//! - Never put feed payload text in an error message
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

// ============================================
// DirectoryError
// ============================================

/// Directory layer error types.
#[derive(Error, Debug)]
pub enum DirectoryError {
    // ========================================
    // Fetch Errors
    // ========================================

    /// The HTTP request could not be completed.
    #[error("Request to {url} failed: {reason}")]
    Http {
        /// Source URL
        url: String,
        /// Why the request failed
        reason: String,
    },

    /// The source answered with a non-success status.
    #[error("Source {url} returned HTTP {status}")]
    Status {
        /// Source URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request did not finish within the configured timeout.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Source URL
        url: String,
        /// Configured timeout
        timeout_secs: u64,
    },

    /// The fetch was cancelled by a shutdown signal.
    #[error("Directory fetch cancelled")]
    Cancelled,

    // ========================================
    // Cache Errors
    // ========================================

    /// No candidate cache file exists.
    #[error("No directory cache found (searched {})", display_paths(.searched))]
    CacheNotFound {
        /// Candidate paths, in search order
        searched: Vec<PathBuf>,
    },

    /// A cache file exists but is not a valid directory.
    #[error("Invalid directory cache at {}: {reason}", .path.display())]
    CacheParse {
        /// Offending file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// I/O error while reading or writing the cache.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DirectoryError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `Http` error.
    pub fn http(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a `CacheParse` error.
    pub fn cache_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if a later fetch might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DirectoryError::Status {
            url: "http://feed.example/api".into(),
            status: 503,
        };
        assert!(err.to_string().contains("http://feed.example/api"));
        assert!(err.to_string().contains("503"));

        let err = DirectoryError::CacheNotFound {
            searched: vec![PathBuf::from("a/servers.json"), PathBuf::from("servers.json")],
        };
        assert!(err.to_string().contains("a/servers.json, servers.json"));
    }

    #[test]
    fn test_error_classification() {
        assert!(DirectoryError::http("http://x", "dns").is_retryable());
        assert!(DirectoryError::Status { url: "u".into(), status: 502 }.is_retryable());
        assert!(!DirectoryError::Status { url: "u".into(), status: 404 }.is_retryable());
        assert!(!DirectoryError::Cancelled.is_retryable());

        let cache_err = DirectoryError::cache_parse("servers.json", "expected value");
        assert!(!cache_err.is_retryable());

        let interrupted = std::io::Error::new(io::ErrorKind::Interrupted, "signal");
        assert!(DirectoryError::io("writing directory cache", interrupted).is_retryable());
    }
}
