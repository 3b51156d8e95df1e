// ============================================
// File: crates/vpn-directory/src/lib.rs
// ============================================
//! # VPN Directory - Server Directory Layer
//!
//! ## Creation Reason
//! Fetches the public server feed, turns it into a short list of
//! candidate servers and keeps the last good list on disk.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`record`]: `DirectoryRecord` and the placeholder record
//! - [`parser`]: Tolerant feed parser with a record cap
//! - [`cache`]: Atomic on-disk cache with path fallback
//! - [`source`]: `DirectorySource` trait and HTTP implementation
//! - [`fetcher`]: Source + parser + cache write-through
//! - [`mock`]: Scripted source for tests
//! - [`error`]: Directory-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  vpn-engine                         │
//! │                      │                              │
//! │                      ▼                              │
//! │                vpn-directory  ◄── You are here     │
//! │                      │                              │
//! │                      ▼                              │
//! │                 vpn-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Feed content is untrusted: only validated identifiers leave the parser
//! - Always go through `DirectorySource` so tests stay offline
//!
//! ## Last Modified
//! v0.1.0 - Initial directory layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod mock;
pub mod parser;
pub mod record;
pub mod source;

// Re-export primary types
pub use cache::{DirectoryCache, DEFAULT_CACHE_FILE};
pub use error::{DirectoryError, Result};
pub use fetcher::DirectoryFetcher;
pub use parser::{parse_directory, ParseOutcome, MAX_DIRECTORY_RECORDS};
pub use record::DirectoryRecord;
pub use source::{DirectorySource, HttpSource, DEFAULT_SOURCE_URL, DEFAULT_TIMEOUT_SECS};
