// ============================================
// File: crates/vpn-engine/src/lib.rs
// ============================================
//! # VPN Engine Library
//!
//! ## Creation Reason
//! Provides the engine behind the `vpn-engine` binary: server directory
//! management plus a single guarded connection session.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Engine configuration management
//! - [`engine`]: Facade used by every command
//! - [`commands`]: Command parsing and output rendering
//! - [`services`]: Business logic services
//!   - [`services::session`]: Connection session state machine
//!   - [`services::events`]: Session events
//! - [`error`]: Engine-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        vpn-engine                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────┐     ┌─────────────┐     ┌──────────────┐  │
//! │  │   Config    │────►│   Engine    │◄────│   Commands   │  │
//! │  └─────────────┘     └──────┬──────┘     └──────────────┘  │
//! │                             │                               │
//! │              ┌──────────────┴──────────────┐                │
//! │              ▼                             ▼                │
//! │  ┌──────────────────────┐     ┌──────────────────────────┐ │
//! │  │  DirectoryFetcher    │     │   ConnectionSession      │ │
//! │  │  (vpn-directory)     │     │   + PhaseDriver          │ │
//! │  └──────────────────────┘     └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - stdout belongs to command output, logs go to stderr
//! - Configuration changes require restart (no hot-reload)
//!
//! ## Last Modified
//! v0.1.0 - Initial engine library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;

// Re-export primary types
pub use commands::Command;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
