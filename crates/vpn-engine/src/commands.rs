// ============================================
// File: crates/vpn-engine/src/commands.rs
// ============================================
//! # Command Dispatch
//!
//! ## Creation Reason
//! The one-shot CLI and the interactive shell accept the same commands and
//! print the same output. Parsing and rendering live here so both stay in
//! step and can be tested without a process.
//!
//! ## Output Contract
//! | Command | stdout |
//! |---------|--------|
//! | `list`, `fetch-public` | JSON array of records |
//! | `connect <id>` | `SUCCESS` or an error token |
//! | `disconnect` | `DISCONNECTED` or an error token |
//! | `status` | JSON session snapshot |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Front-ends parse this output, never change the tokens casually
//! - Diagnostics go to logs (stderr), never to stdout
//!
//! ## Last Modified
//! v0.1.0 - Initial command dispatch

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::services::SessionState;

/// Printed after a successful connect.
pub const SUCCESS: &str = "SUCCESS";
/// Printed after a disconnect.
pub const DISCONNECTED: &str = "DISCONNECTED";
/// Printed by the shell for an unrecognised line.
pub const UNKNOWN_COMMAND: &str = "ERROR_UNKNOWN_COMMAND";

/// A parsed engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the cached directory.
    List,
    /// Refresh the directory, optionally from another URL.
    FetchPublic {
        /// Source override
        url: Option<String>,
    },
    /// Connect to a server (validated at execution).
    Connect {
        /// Raw identifier as typed
        id: String,
    },
    /// Disconnect or cancel a connect.
    Disconnect,
    /// Print the session snapshot.
    Status,
    /// Leave the shell.
    Quit,
}

impl Command {
    /// Parses one shell line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    /// Returns the offending verb if the line is not a command.
    pub fn parse_line(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next().map(str::to_string);
        if words.next().is_some() {
            return Err(verb.to_string());
        }

        let command = match (verb, arg) {
            ("list", None) => Self::List,
            ("fetch-public", url) => Self::FetchPublic { url },
            ("connect", Some(id)) => Self::Connect { id },
            ("disconnect", None) => Self::Disconnect,
            ("status", None) => Self::Status,
            ("quit" | "exit", None) => Self::Quit,
            _ => return Err(verb.to_string()),
        };
        Ok(Some(command))
    }
}

/// Runs `command` against `engine` and returns what to print.
///
/// `Quit` is the caller's business and renders as an empty string.
pub async fn execute(engine: &Engine, command: &Command) -> String {
    match command {
        Command::List => to_json(&engine.list().await),
        Command::FetchPublic { url } => to_json(&engine.fetch_public(url.as_deref()).await),
        Command::Connect { id } => render_connect(engine.connect(id).await),
        Command::Disconnect => render_disconnect(engine.disconnect().await),
        Command::Status => to_json(&engine.status()),
        Command::Quit => String::new(),
    }
}

/// Starts a connect on a background task, for the interactive shell.
///
/// The session is claimed before this returns, so a `disconnect` on the
/// next line always sees `Connecting` and cancels it. The handle yields
/// what to print once the connect ends.
///
/// # Errors
/// Returns the rendered token if the connect could not start.
pub fn spawn_connect(engine: &Arc<Engine>, raw_id: &str) -> Result<JoinHandle<String>, String> {
    let pending = engine.begin_connect(raw_id).map_err(|e| e.token().to_string())?;
    let engine = Arc::clone(engine);
    Ok(tokio::spawn(async move {
        render_connect(engine.finish_connect(pending).await)
    }))
}

/// Renders the outcome of a connect.
#[must_use]
pub fn render_connect(result: Result<(), EngineError>) -> String {
    match result {
        Ok(()) => SUCCESS.to_string(),
        Err(e) => e.token().to_string(),
    }
}

/// Renders the outcome of a disconnect.
///
/// Disconnecting an already disconnected session still prints
/// `DISCONNECTED`.
#[must_use]
pub fn render_disconnect(result: Result<(), EngineError>) -> String {
    match result {
        Ok(())
        | Err(EngineError::InvalidTransition {
            state: SessionState::Disconnected,
            ..
        }) => DISCONNECTED.to_string(),
        Err(e) => e.token().to_string(),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to render output");
        String::from("null")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::services::{SessionEventSender, SimulatedDriver};
    use std::time::Duration;
    use vpn_directory::mock::MockSource;

    fn engine(dir: &tempfile::TempDir) -> (Arc<MockSource>, Engine) {
        let mut config = EngineConfig::default();
        config.cache.dir = dir.path().join("engine");
        let source = Arc::new(MockSource::new());
        let engine = Engine::with_parts(
            config,
            source.clone(),
            Arc::new(SimulatedDriver::new(Duration::from_millis(500), Duration::from_millis(1000))),
            SessionEventSender::disabled(),
        );
        (source, engine)
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(Command::parse_line("  "), Ok(None));
        assert_eq!(Command::parse_line("list"), Ok(Some(Command::List)));
        assert_eq!(
            Command::parse_line("fetch-public"),
            Ok(Some(Command::FetchPublic { url: None }))
        );
        assert_eq!(
            Command::parse_line("fetch-public http://x/"),
            Ok(Some(Command::FetchPublic {
                url: Some("http://x/".into())
            }))
        );
        assert_eq!(
            Command::parse_line("connect 1.2.3.4"),
            Ok(Some(Command::Connect { id: "1.2.3.4".into() }))
        );
        assert_eq!(Command::parse_line("quit"), Ok(Some(Command::Quit)));
        assert_eq!(Command::parse_line("connect"), Err("connect".into()));
        assert_eq!(Command::parse_line("connect a b"), Err("connect".into()));
        assert_eq!(Command::parse_line("reboot"), Err("reboot".into()));
    }

    #[tokio::test]
    async fn test_list_prints_placeholder_json() {
        let dir = tempfile::tempdir().unwrap();
        let (_source, engine) = engine(&dir);
        let out = execute(&engine, &Command::List).await;
        assert_eq!(
            out,
            r#"[{"id":"local","name":"No servers found (run fetch-public)","ip":"0.0.0.0","load":"0%"}]"#
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_prints_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let (_source, engine) = engine(&dir);
        let out = execute(&engine, &Command::FetchPublic { url: None }).await;
        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn test_fetch_prints_records() {
        let dir = tempfile::tempdir().unwrap();
        let (source, engine) = engine(&dir);
        source.push_body("host,1.2.3.4,0,0,5000000,Germany,DE,x");

        let out = execute(&engine, &Command::FetchPublic { url: None }).await;
        assert_eq!(
            out,
            r#"[{"id":"1.2.3.4","name":"Germany (5 Mbps)","ip":"1.2.3.4","load":"Public"}]"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_commands() {
        let dir = tempfile::tempdir().unwrap();
        let (_source, engine) = engine(&dir);

        let out = execute(&engine, &Command::Connect { id: "1.2.3.4|x".into() }).await;
        assert_eq!(out, "ERROR_INVALID_ID");

        let out = execute(&engine, &Command::Connect { id: "1.2.3.4".into() }).await;
        assert_eq!(out, SUCCESS);

        let out = execute(&engine, &Command::Connect { id: "1.2.3.4".into() }).await;
        assert_eq!(out, "ERROR_INVALID_TRANSITION");

        let out = execute(&engine, &Command::Status).await;
        assert!(out.contains(r#""state":"Connected""#));

        assert_eq!(execute(&engine, &Command::Disconnect).await, DISCONNECTED);
        assert_eq!(execute(&engine, &Command::Disconnect).await, DISCONNECTED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_connect_cancelled_by_next_line() {
        let dir = tempfile::tempdir().unwrap();
        let (_source, engine) = engine(&dir);
        let engine = Arc::new(engine);

        let outcome = spawn_connect(&engine, "1.2.3.4").unwrap();
        let status = execute(&engine, &Command::Status).await;
        assert!(status.contains(r#""state":"Connecting""#), "{status}");

        assert_eq!(execute(&engine, &Command::Disconnect).await, DISCONNECTED);
        assert_eq!(outcome.await.unwrap(), "ERROR_CANCELLED");
        assert_eq!(engine.status().state, SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_connect_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let (_source, engine) = engine(&dir);
        let engine = Arc::new(engine);

        assert_eq!(
            spawn_connect(&engine, "1.2.3.4|x").unwrap_err(),
            "ERROR_INVALID_ID"
        );

        let first = spawn_connect(&engine, "1.2.3.4").unwrap();
        assert_eq!(
            spawn_connect(&engine, "5.6.7.8").unwrap_err(),
            "ERROR_INVALID_TRANSITION"
        );
        assert_eq!(first.await.unwrap(), SUCCESS);
        assert_eq!(engine.status().state, SessionState::Connected);
    }

    #[test]
    fn test_render_disconnect_while_disconnecting() {
        let out = render_disconnect(Err(EngineError::InvalidTransition {
            operation: "disconnect",
            state: SessionState::Disconnecting,
        }));
        assert_eq!(out, "ERROR_INVALID_TRANSITION");
    }
}
