// ============================================
// File: crates/vpn-engine/src/main.rs
// ============================================
//! # VPN Engine Entry Point
//!
//! ## Creation Reason
//! Main entry point for the `vpn-engine` binary. Handles CLI parsing,
//! logging setup and command execution.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing (stderr)
//! - Configuration loading
//! - One-shot commands and the interactive shell
//!
//! ## Usage
//! ```bash
//! vpn-engine fetch-public           # refresh the directory
//! vpn-engine list                   # print the cached directory
//! vpn-engine connect 1.2.3.4        # SUCCESS or an error token
//! vpn-engine shell                  # one command per stdin line
//! vpn-engine -c engine.toml validate
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One-shot commands each get a fresh session, only `shell` keeps one
//!   across commands
//! - In the shell, `connect` claims the session before the next line is
//!   read, then runs in the background so `disconnect` can cancel it
//! - Logging starts at `info` (or the `-v` level) before the config is
//!   read, the configured level is applied once it loads
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use vpn_engine::commands::{self, Command, UNKNOWN_COMMAND};
use vpn_engine::services::{EventLogger, SessionEventSender, SessionState};
use vpn_engine::{Engine, EngineConfig};

/// Handle used to apply the configured log level once config is loaded.
type LogHandle = reload::Handle<EnvFilter, Registry>;

// ============================================
// CLI Definition
// ============================================

/// VPN engine: server directory and connection session control.
#[derive(Parser, Debug)]
#[command(name = "vpn-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply if absent)
    #[arg(short, long, global = true, default_value = "vpn-engine.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the cached server directory as JSON
    List,

    /// Refresh the server directory from the public feed
    FetchPublic {
        /// Feed URL (overrides the configured source)
        #[arg(long)]
        url: Option<String>,
    },

    /// Connect to a server by identifier
    Connect {
        /// Server identifier ([A-Za-z0-9.-]+)
        id: String,
    },

    /// Disconnect the current session
    Disconnect,

    /// Print the session state as JSON
    Status,

    /// Validate configuration file
    Validate,

    /// Read commands from stdin, one per line, keeping one session
    Shell,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging, refined once the config is loaded
    let log = init_logging(level_for("info", cli.verbose));

    // Execute command
    let result = match cli.command {
        Commands::Validate => cmd_validate(&cli.config).await,
        Commands::Shell => cmd_shell(&cli.config, cli.verbose, &log).await,
        Commands::List => cmd_once(&cli.config, cli.verbose, &log, Command::List).await,
        Commands::FetchPublic { url } => {
            cmd_once(&cli.config, cli.verbose, &log, Command::FetchPublic { url }).await
        }
        Commands::Connect { id } => {
            cmd_once(&cli.config, cli.verbose, &log, Command::Connect { id }).await
        }
        Commands::Disconnect => cmd_once(&cli.config, cli.verbose, &log, Command::Disconnect).await,
        Commands::Status => cmd_once(&cli.config, cli.verbose, &log, Command::Status).await,
    };

    // Handle errors
    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs a single command with a fresh engine.
async fn cmd_once(
    config_path: &Path,
    verbose: u8,
    log: &LogHandle,
    command: Command,
) -> anyhow::Result<()> {
    let engine = open_engine(config_path, verbose, log, SessionEventSender::disabled()).await?;

    if command == Command::Disconnect && engine.status().state == SessionState::Disconnected {
        warn!("No active session in this process, nothing to disconnect");
    }

    let output = commands::execute(&engine, &command).await;
    println!("{}", output);

    engine.shutdown();
    Ok(())
}

/// Interactive mode: one command per stdin line.
async fn cmd_shell(config_path: &Path, verbose: u8, log: &LogHandle) -> anyhow::Result<()> {
    let (shutdown_tx, _) = broadcast::channel(1);
    let (logger, events) = EventLogger::new();

    let engine = Arc::new(open_engine(config_path, verbose, log, events).await?);
    let logger_task = tokio::spawn(logger.run(shutdown_tx.subscribe()));
    info!("Shell started, type 'quit' to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(verb) => {
                debug!(verb = %verb, "Unknown shell command");
                println!("{}", UNKNOWN_COMMAND);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Connect { id } => match commands::spawn_connect(&engine, &id) {
                Ok(outcome) => {
                    tokio::spawn(async move {
                        match outcome.await {
                            Ok(output) => println!("{}", output),
                            Err(e) => warn!(error = %e, "Connect task failed"),
                        }
                    });
                }
                Err(output) => println!("{}", output),
            },
            other => println!("{}", commands::execute(&engine, &other).await),
        }
    }

    if engine.status().state != SessionState::Disconnected {
        info!("Closing active session before exit");
        let _ = engine.disconnect().await;
    }

    engine.shutdown();
    let _ = shutdown_tx.send(());
    let _ = logger_task.await;

    info!("Shell stopped");
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Engine will use default values.");
        return Ok(());
    }

    let config = EngineConfig::load(config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Directory:");
    println!("   Source:     {}", config.directory.source_url);
    println!("   Timeout:    {}s", config.directory.request_timeout_secs);
    println!();
    println!("Cache:");
    println!(
        "   File:       {}",
        config.cache.dir.join(&config.cache.file_name).display()
    );
    println!();
    println!("Session:");
    println!("   Phase:      {}ms", config.session.phase_delay_ms);
    println!("   Teardown:   {}ms", config.session.teardown_delay_ms);
    println!();
    println!("Logging:");
    println!("   Level:      {}", config.logging.level);

    Ok(())
}

// ============================================
// Helpers
// ============================================

/// Opens the engine and applies the configured log level.
///
/// A startup failure prints its token on stdout, like any command outcome.
async fn open_engine(
    config_path: &Path,
    verbose: u8,
    log: &LogHandle,
    events: SessionEventSender,
) -> anyhow::Result<Engine> {
    let engine = match Engine::open(config_path, events).await {
        Ok(engine) => engine,
        Err(e) => {
            println!("{}", e.token());
            if e.is_config_error() {
                warn!(
                    path = %config_path.display(),
                    "Fix or remove the configuration file to run with defaults"
                );
            }
            return Err(e.into());
        }
    };

    set_log_level(log, level_for(&engine.config().logging.level, verbose));
    Ok(engine)
}

/// Effective level: `-v` overrides the configured one.
fn level_for(configured: &str, verbose: u8) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Initializes logging to stderr.
fn init_logging(level: &str) -> LogHandle {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .ok();

    handle
}

/// Replaces the log filter, unless `RUST_LOG` pins it.
fn set_log_level(log: &LogHandle, level: &str) {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    if let Err(e) = log.reload(EnvFilter::new(level)) {
        warn!(error = %e, "Failed to apply log level");
    }
}
