// ============================================
// File: crates/vpn-engine/src/services/session.rs
// ============================================
//! # Connection Session Service
//!
//! ## Creation Reason
//! Owns the single connection session and enforces which transitions are
//! legal, so concurrent commands cannot interleave phases.
//!
//! ## Main Functionality
//! - `SessionState` / `SessionPhase`: State machine vocabulary
//! - `PhaseDriver`: Async trait performing each phase's side effects
//! - `SimulatedDriver`: Timed stand-in driver
//! - `ConnectionSession`: Guarded connect / disconnect
//! - `PendingConnect`: A claimed connect, for callers that run it on
//!   another task
//!
//! ## Session Lifecycle
//! ```text
//! ┌──────────────┐  connect   ┌────────────┐  3 phases ok  ┌───────────┐
//! │ Disconnected │ ─────────► │ Connecting │ ────────────► │ Connected │
//! └──────────────┘            └─────┬──────┘               └─────┬─────┘
//!        ▲                          │ phase failed               │ disconnect
//!        │◄─────────────────────────┤                            ▼
//!        │                          │ disconnect         ┌───────────────┐
//!        │                          └──────────────────► │ Disconnecting │
//!        │                               (cancel)        └───────┬───────┘
//!        └─────────────────── teardown ──────────────────────────┘
//! ```
//!
//! ## Concurrency
//! State lives in a `watch` channel. Every transition is a compare-and-set
//! through `send_if_modified`, so two callers can never both leave the same
//! state. A disconnect during `Connecting` only raises `cancel_requested`;
//! the in-flight connect notices, tears down and ends `Disconnected`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - A disconnect that cancels a connect waits for that connect to finish,
//!   so the connect future must be polled by another task
//! - Dropping an in-flight connect or disconnect resets the session to
//!   `Disconnected` (see `ResetGuard`)
//! - Teardown failures are logged, the session still ends `Disconnected`
//!
//! ## Last Modified
//! v0.1.0 - Initial session state machine

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vpn_common::ServerId;

use crate::error::{EngineError, Result};
use super::events::SessionEventSender;

// ============================================
// SessionState
// ============================================

/// Connection session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    /// No connection and nothing in flight.
    Disconnected,
    /// Connect phases are running.
    Connecting,
    /// All connect phases completed.
    Connected,
    /// Teardown is running.
    Disconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

// ============================================
// SessionPhase
// ============================================

/// A unit of work inside a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionPhase {
    /// Bring up the tunnel interface.
    TunnelInit,
    /// Key exchange with the server.
    Handshake,
    /// Verify the negotiated channel.
    IntegrityCheck,
    /// Release everything set up by the connect phases.
    Teardown,
}

impl SessionPhase {
    /// Phases run by `connect`, in order.
    pub const CONNECT: [Self; 3] = [Self::TunnelInit, Self::Handshake, Self::IntegrityCheck];
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TunnelInit => write!(f, "TunnelInit"),
            Self::Handshake => write!(f, "Handshake"),
            Self::IntegrityCheck => write!(f, "IntegrityCheck"),
            Self::Teardown => write!(f, "Teardown"),
        }
    }
}

// ============================================
// PhaseDriver
// ============================================

/// Performs the side effects of each phase.
#[async_trait]
pub trait PhaseDriver: Send + Sync {
    /// Runs `phase` against `target`.
    ///
    /// # Errors
    /// Any error aborts the transition. It is reported as `PhaseFailed`.
    async fn run(&self, phase: SessionPhase, target: &ServerId) -> Result<()>;
}

/// Driver that only waits, one delay per connect phase and one for teardown.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    phase_delay: Duration,
    teardown_delay: Duration,
}

impl SimulatedDriver {
    /// Creates a driver with explicit delays.
    #[must_use]
    pub const fn new(phase_delay: Duration, teardown_delay: Duration) -> Self {
        Self {
            phase_delay,
            teardown_delay,
        }
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(1000))
    }
}

#[async_trait]
impl PhaseDriver for SimulatedDriver {
    async fn run(&self, phase: SessionPhase, target: &ServerId) -> Result<()> {
        let delay = match phase {
            SessionPhase::Teardown => self.teardown_delay,
            _ => self.phase_delay,
        };
        debug!(phase = %phase, target = %target, delay_ms = delay.as_millis() as u64, "Simulating phase");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

// ============================================
// SessionSnapshot
// ============================================

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Current state.
    pub state: SessionState,
    /// Server being connected to or connected to.
    pub target: Option<ServerId>,
    /// Whole seconds since the session became `Connected`.
    pub connected_secs: Option<u64>,
}

// ============================================
// Shared state
// ============================================

#[derive(Debug, Clone)]
struct Shared {
    state: SessionState,
    target: Option<ServerId>,
    cancel_requested: bool,
    connected_at: Option<Instant>,
    /// Bumped on every connect, lets a stale guard recognise a newer run.
    generation: u64,
}

impl Shared {
    fn clear(&mut self) {
        self.state = SessionState::Disconnected;
        self.target = None;
        self.cancel_requested = false;
        self.connected_at = None;
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            target: None,
            cancel_requested: false,
            connected_at: None,
            generation: 0,
        }
    }
}

async fn wait_until(mut rx: watch::Receiver<Shared>, pred: impl Fn(&Shared) -> bool) {
    loop {
        let done = pred(&*rx.borrow_and_update());
        if done {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ============================================
// ConnectionSession
// ============================================

/// The single connection session of an engine.
pub struct ConnectionSession {
    shared: Arc<watch::Sender<Shared>>,
    driver: Arc<dyn PhaseDriver>,
    events: SessionEventSender,
}

impl ConnectionSession {
    /// Creates a disconnected session.
    pub fn new(driver: Arc<dyn PhaseDriver>, events: SessionEventSender) -> Self {
        let (shared, _) = watch::channel(Shared::default());
        Self {
            shared: Arc::new(shared),
            driver,
            events,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.borrow().state
    }

    /// Current state, target and connected time.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let shared = self.shared.borrow();
        SessionSnapshot {
            state: shared.state,
            target: shared.target.clone(),
            connected_secs: shared.connected_at.map(|at| at.elapsed().as_secs()),
        }
    }

    /// Connects to `target`.
    ///
    /// # Errors
    /// - `InvalidTransition` unless the session is `Disconnected`
    /// - `PhaseFailed` if the driver fails (session back to `Disconnected`)
    /// - `Cancelled` if a disconnect arrived first (session `Disconnected`)
    pub async fn connect(&self, target: ServerId) -> Result<()> {
        let pending = self.begin_connect(target)?;
        self.finish_connect(pending).await
    }

    /// Claims the session for a connect without running any phase.
    ///
    /// On success the session is already `Connecting`, so a disconnect
    /// issued right after this returns cancels the connect.
    ///
    /// # Errors
    /// `InvalidTransition` unless the session is `Disconnected`.
    pub fn begin_connect(&self, target: ServerId) -> Result<PendingConnect> {
        let mut generation = 0;
        let began = self.transition(SessionState::Disconnected, SessionState::Connecting, |s| {
            s.target = Some(target.clone());
            s.cancel_requested = false;
            s.connected_at = None;
            s.generation += 1;
            generation = s.generation;
        });
        if !began {
            let state = self.state();
            warn!(target = %target, state = %state, "Connect rejected");
            return Err(EngineError::InvalidTransition {
                operation: "connect",
                state,
            });
        }

        Ok(PendingConnect {
            target,
            guard: ResetGuard {
                shared: Arc::clone(&self.shared),
                generation,
                armed: true,
            },
        })
    }

    /// Runs the connect phases of a connect claimed by
    /// [`begin_connect`](Self::begin_connect) on this session.
    ///
    /// # Errors
    /// Same as [`connect`](Self::connect), minus the initial state check.
    pub async fn finish_connect(&self, pending: PendingConnect) -> Result<()> {
        let PendingConnect { target, mut guard } = pending;
        debug_assert!(Arc::ptr_eq(&guard.shared, &self.shared), "pending connect from another session");

        for phase in SessionPhase::CONNECT {
            self.events.phase_started(phase, &target);
            debug!(target = %target, phase = %phase, "Phase started");

            let cancel = wait_until(self.shared.subscribe(), |s| s.cancel_requested);
            let result = tokio::select! {
                biased;

                () = cancel => return self.finish_cancelled(&target).await,
                result = self.driver.run(phase, &target) => result,
            };

            if let Err(e) = result {
                warn!(target = %target, phase = %phase, error = %e, "Phase failed, rolling back");
                self.transition(SessionState::Connecting, SessionState::Disconnected, Shared::clear);
                return Err(match e {
                    EngineError::PhaseFailed { .. } => e,
                    other => EngineError::phase_failed(phase, other.to_string()),
                });
            }
        }

        let connected = self.transition(SessionState::Connecting, SessionState::Connected, |s| {
            s.connected_at = Some(Instant::now());
        });
        if !connected {
            return self.finish_cancelled(&target).await;
        }
        guard.armed = false;

        info!(target = %target, "Session connected");
        Ok(())
    }

    /// Disconnects, or cancels an in-flight connect.
    ///
    /// Returns once the session is `Disconnected`.
    ///
    /// # Errors
    /// `InvalidTransition` from `Disconnected` or `Disconnecting`.
    pub async fn disconnect(&self) -> Result<()> {
        enum Begin {
            Teardown(Option<ServerId>, u64),
            JoinCancel,
            Reject(SessionState),
        }

        let mut begin = Begin::Reject(SessionState::Disconnected);
        self.shared.send_if_modified(|s| match s.state {
            SessionState::Connected => {
                begin = Begin::Teardown(s.target.clone(), s.generation);
                false
            }
            SessionState::Connecting => {
                begin = Begin::JoinCancel;
                let newly = !s.cancel_requested;
                s.cancel_requested = true;
                newly
            }
            other => {
                begin = Begin::Reject(other);
                false
            }
        });

        match begin {
            Begin::Reject(state) => {
                warn!(state = %state, "Disconnect rejected");
                Err(EngineError::InvalidTransition {
                    operation: "disconnect",
                    state,
                })
            }
            Begin::JoinCancel => {
                info!("Disconnect requested while connecting, cancelling");
                wait_until(self.shared.subscribe(), |s| s.state == SessionState::Disconnected).await;
                Ok(())
            }
            Begin::Teardown(target, generation) => {
                if !self.transition(SessionState::Connected, SessionState::Disconnecting, |_| {}) {
                    // Lost a race with another disconnect.
                    let state = self.state();
                    return Err(EngineError::InvalidTransition {
                        operation: "disconnect",
                        state,
                    });
                }
                let _guard = ResetGuard {
                    shared: Arc::clone(&self.shared),
                    generation,
                    armed: true,
                };
                if let Some(target) = target {
                    self.teardown(&target).await;
                }
                self.transition(SessionState::Disconnecting, SessionState::Disconnected, Shared::clear);
                info!("Session disconnected");
                Ok(())
            }
        }
    }

    async fn finish_cancelled(&self, target: &ServerId) -> Result<()> {
        info!(target = %target, "Connect cancelled, tearing down");
        self.transition(SessionState::Connecting, SessionState::Disconnecting, |_| {});
        self.teardown(target).await;
        self.transition(SessionState::Disconnecting, SessionState::Disconnected, Shared::clear);
        Err(EngineError::Cancelled)
    }

    async fn teardown(&self, target: &ServerId) {
        self.events.phase_started(SessionPhase::Teardown, target);
        debug!(target = %target, phase = %SessionPhase::Teardown, "Phase started");
        if let Err(e) = self.driver.run(SessionPhase::Teardown, target).await {
            warn!(target = %target, error = %e, "Teardown failed");
        }
    }

    /// Moves `from` → `to` atomically, applying `update` on success.
    ///
    /// A pending cancel blocks `Connecting` → `Connected`.
    fn transition(
        &self,
        from: SessionState,
        to: SessionState,
        update: impl FnOnce(&mut Shared),
    ) -> bool {
        let mut target = None;
        let changed = self.shared.send_if_modified(|s| {
            if s.state != from || (to == SessionState::Connected && s.cancel_requested) {
                return false;
            }
            let previous = s.target.clone();
            s.state = to;
            update(s);
            target = s.target.clone().or(previous);
            true
        });

        if changed {
            info!(from = %from, to = %to, target = ?target, "Session state changed");
            self.events.state_changed(from, to, target);
        }
        changed
    }
}

// ============================================
// PendingConnect
// ============================================

/// A connect that holds the session in `Connecting` but has not run its
/// phases yet. Dropping it unrun resets the session to `Disconnected`.
#[must_use = "the session stays Connecting until this is finished or dropped"]
pub struct PendingConnect {
    target: ServerId,
    guard: ResetGuard,
}

impl PendingConnect {
    /// Server this connect is for.
    #[must_use]
    pub fn target(&self) -> &ServerId {
        &self.target
    }
}

impl fmt::Debug for PendingConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConnect")
            .field("target", &self.target)
            .field("generation", &self.guard.generation)
            .finish()
    }
}

/// Resets an abandoned transition to `Disconnected` when dropped.
struct ResetGuard {
    shared: Arc<watch::Sender<Shared>>,
    generation: u64,
    armed: bool,
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        let reset = self.shared.send_if_modified(|s| {
            let in_flight = matches!(s.state, SessionState::Connecting | SessionState::Disconnecting);
            if in_flight && s.generation == generation {
                s.clear();
                true
            } else {
                false
            }
        });
        if reset {
            warn!("Session transition abandoned, reset to Disconnected");
        }
    }
}

// ============================================
// Tests
// ============================================
