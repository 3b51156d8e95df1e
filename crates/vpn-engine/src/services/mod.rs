// ============================================
// File: crates/vpn-engine/src/services/mod.rs
// ============================================
//! # Engine Services
//!
//! ## Creation Reason
//! Business logic of the engine, separated from CLI and configuration.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`session`]: Connection session state machine
//! - [`events`]: Session event channel and logger
//!
//! ## ⚠️ Important Note for Next Developer
//! - Side effects of connecting live behind `PhaseDriver`
//! - Thread-safe by design (Send + Sync)
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod events;
pub mod session;

// Re-export primary types
pub use events::{EventLogger, SessionEvent, SessionEventSender};
pub use session::{
    ConnectionSession, PendingConnect, PhaseDriver, SessionPhase, SessionSnapshot, SessionState,
    SimulatedDriver,
};
