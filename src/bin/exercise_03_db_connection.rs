//! Exercise 03: Database Connection Guard
//! One simulated connection, opened once and shared by every component
//!
//! Run with: cargo run --bin exercise_03_db_connection

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use colored::Colorize;
use thiserror::Error;

use singleton_patterns::get_instance;

// =============================================================================
// Connection state machine
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    #[error("No active session to close")]
    NotConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Offline,
    Online,
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnState::Offline => write!(f, "OFFLINE"),
            ConnState::Online => write!(f, "ONLINE"),
        }
    }
}

/// What a call to [`DbConnection::connect`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// This call performed the handshake and brought the session up.
    Established,
    /// A session was already up; the existing one is reused.
    AlreadyOnline,
}

/// Simulated database connection. The state lives behind a `Mutex`, and the
/// handshake runs while holding it, so racing `connect` calls serialize and
/// exactly one of them performs the handshake.
pub struct DbConnection {
    host: String,
    port: u16,
    latency: Duration,
    state: Mutex<ConnState>,
}

impl DbConnection {
    /// A connection with a realistic simulated handshake latency.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_latency(host, port, Duration::from_secs(1))
    }

    /// Same state machine, custom latency. Tests pass `Duration::ZERO`.
    pub fn with_latency(host: impl Into<String>, port: u16, latency: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            latency,
            state: Mutex::new(ConnState::Offline),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Brings the session up if it is down; otherwise reuses the live one.
    pub fn connect(&self) -> ConnectOutcome {
        let mut state = self.lock();
        match *state {
            ConnState::Offline => {
                thread::sleep(self.latency);
                *state = ConnState::Online;
                ConnectOutcome::Established
            }
            ConnState::Online => ConnectOutcome::AlreadyOnline,
        }
    }

    /// Closes the session. Closing an offline connection is an error.
    pub fn disconnect(&self) -> Result<(), ConnectionError> {
        let mut state = self.lock();
        match *state {
            ConnState::Online => {
                thread::sleep(self.latency / 2);
                *state = ConnState::Offline;
                Ok(())
            }
            ConnState::Offline => Err(ConnectionError::NotConnected),
        }
    }

    pub fn status(&self) -> ConnState {
        *self.lock()
    }

    pub fn is_online(&self) -> bool {
        self.status() == ConnState::Online
    }

    fn lock(&self) -> MutexGuard<'_, ConnState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Demonstration
// =============================================================================

fn production_connection() -> DbConnection {
    DbConnection::new("192.168.1.10", 5432)
}

fn main() {
    println!("=== Exercise 03: Database Connection Guard ===\n");

    // Two components each grab "their" connection from the registry.
    let primary = get_instance(production_connection);
    let reporting = get_instance(production_connection);

    println!(
        "System state before anything happens: {}",
        primary.status()
    );

    println!("\n--- Attempt 1: primary component connects ---");
    println!("[DB] Opening session to {}:{}...", primary.host(), primary.port());
    match primary.connect() {
        ConnectOutcome::Established => {
            println!("{}", "[DB] Session established successfully".green())
        }
        ConnectOutcome::AlreadyOnline => {
            println!("{}", "[DB] Warning: session already live, reusing it".yellow())
        }
    }

    println!("\n--- Attempt 2: reporting component connects (duplicate) ---");
    match reporting.connect() {
        ConnectOutcome::Established => {
            println!("{}", "[DB] Session established successfully".green())
        }
        ConnectOutcome::AlreadyOnline => {
            println!("{}", "[DB] Warning: session already live, reusing it".yellow())
        }
    }

    println!("\n--- Cross-handle state check ---");
    println!(
        "Reporting component sees: {} (online: {})",
        reporting.status(),
        reporting.is_online()
    );

    println!("\n--- Disconnect ---");
    match primary.disconnect() {
        Ok(()) => println!("[DB] Session closed cleanly"),
        Err(err) => println!("{}", format!("[DB] {err}").red()),
    }
    println!("Reporting component now sees: {}", reporting.status());

    // Closing again exercises the error path without panicking anything.
    println!("\n--- Disconnect again (nothing to close) ---");
    match reporting.disconnect() {
        Ok(()) => println!("[DB] Session closed cleanly"),
        Err(err) => println!("{}", format!("[DB] {err}").red()),
    }

    println!("\nSame connection object in both components: {}",
        Arc::ptr_eq(&primary, &reporting)
    );

    println!("\n=== Key Points ===");
    println!("1. The registry guarantees a single connection object");
    println!("2. The handshake runs under the lock; duplicates just reuse it");
    println!("3. State changes made through one handle appear in all handles");
    println!("4. Closing a closed session is a typed, recoverable error");
}
