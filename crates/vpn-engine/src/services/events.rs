// ============================================
// File: crates/vpn-engine/src/services/events.rs
// ============================================
//! # Session Events
//!
//! Observable record of what a `ConnectionSession` is doing.
//!
//! Main Components:
//!   - SessionEvent: Phase start or state change
//!   - SessionEventSender: Cloneable, optionally disabled sender
//!   - EventLogger: Background task that logs events until shutdown
//!
//! ⚠️ Important Note for Next Developer:
//!   - Sending never blocks, a full channel drops the event
//!   - The session logs transitions itself, subscribers are optional
//!
//! Last Modified: v0.1.0 - Initial session events
// ============================================

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use vpn_common::ServerId;

use super::session::{SessionPhase, SessionState};

/// Default channel capacity for event subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Something observable that happened in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session moved between states.
    StateChanged {
        /// Previous state
        from: SessionState,
        /// New state
        to: SessionState,
        /// Target server, if any
        target: Option<ServerId>,
    },
    /// A connect or teardown phase started.
    PhaseStarted {
        /// Phase about to run
        phase: SessionPhase,
        /// Target server
        target: ServerId,
    },
}

/// Cloneable sender for session events.
///
/// A disabled sender discards everything.
#[derive(Debug, Clone)]
pub struct SessionEventSender {
    tx: Option<mpsc::Sender<SessionEvent>>,
}

impl SessionEventSender {
    /// Creates a new enabled sender with the given channel.
    #[must_use]
    pub fn new(tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Creates a disabled sender that discards all events.
    #[must_use]
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Creates an enabled sender and its receiving end.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Returns `true` if events are delivered somewhere.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Sends a state change event.
    pub fn state_changed(&self, from: SessionState, to: SessionState, target: Option<ServerId>) {
        self.send(SessionEvent::StateChanged { from, to, target });
    }

    /// Sends a phase start event.
    pub fn phase_started(&self, phase: SessionPhase, target: &ServerId) {
        self.send(SessionEvent::PhaseStarted {
            phase,
            target: target.clone(),
        });
    }

    fn send(&self, event: SessionEvent) {
        if let Some(ref tx) = self.tx {
            if tx.try_send(event).is_err() {
                debug!("Session event dropped");
            }
        }
    }
}

impl Default for SessionEventSender {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Background task that logs session events.
pub struct EventLogger {
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl EventLogger {
    /// Creates a new logger and returns the sender feeding it.
    #[must_use]
    pub fn new() -> (Self, SessionEventSender) {
        let (tx, rx) = SessionEventSender::channel(EVENT_CHANNEL_CAPACITY);
        (Self { event_rx: rx }, tx)
    }

    /// Runs until shutdown or until every sender is gone.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        debug!("Event logger started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => { debug!("Event logger stopping"); break; }
                event = self.event_rx.recv() => match event {
                    Some(SessionEvent::StateChanged { from, to, target }) => {
                        info!(from = %from, to = %to, target = ?target, "Session event: state changed");
                    }
                    Some(SessionEvent::PhaseStarted { phase, target }) => {
                        info!(phase = %phase, target = %target, "Session event: phase started");
                    }
                    None => break,
                },
            }
        }
    }
}
