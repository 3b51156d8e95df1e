// ============================================
// File: crates/vpn-common/src/lib.rs
// ============================================
//! # VPN Common - Shared Types Library
//!
//! ## Creation Reason
//! Holds the identifier type and base error shared by the directory and
//! engine crates.
//!
//! ## Main Functionality
//! - [`types`]: `ServerId` and the identifier whitelist
//! - [`error`]: Common error types and result alias
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  vpn-engine                         │
//! │                      │                              │
//! │                      ▼                              │
//! │                vpn-directory                        │
//! │                      │                              │
//! │                      ▼                              │
//! │                 vpn-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Leaf crate, keep dependencies minimal
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::{CommonError, Result};
pub use types::{is_valid_id, ServerId};
