//! Exercise 02: Centralized Event Logger
//! One in-memory event timeline shared by every subsystem and thread
//!
//! Run with: cargo run --bin exercise_02_event_logger

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;

use singleton_patterns::get_instance;

// =============================================================================
// The event log singleton
// =============================================================================

/// One recorded event: when it happened (relative to log creation), which
/// subsystem reported it, and what it said.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub elapsed: Duration,
    pub source: String,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[+{:.3}s] {}: {}",
            self.elapsed.as_secs_f64(),
            self.source,
            self.message
        )
    }
}

/// Append-only event sink. Entries land in commit order no matter which
/// thread or subsystem reported them, because the push happens under one
/// lock with the timestamp taken inside it.
pub struct EventLog {
    started: Instant,
    entries: Mutex<Vec<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Records one event from the named subsystem.
    pub fn record(&self, source: &str, message: impl Into<String>) {
        let mut entries = self.lock();
        entries.push(LogEntry {
            elapsed: self.started.elapsed(),
            source: source.to_string(),
            message: message.into(),
        });
    }

    /// A snapshot of the timeline so far, in commit order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Demonstration
// =============================================================================

fn main() {
    println!("=== Exercise 02: Centralized Event Logger ===\n");

    // Two subsystems each believe they own "their" logger.
    let system_log = get_instance(EventLog::new);
    let auth_log = get_instance(EventLog::new);
    println!("Timeline starts empty: {}\n", system_log.is_empty());

    system_log.record("system", "Startup completed successfully.");
    auth_log.record("auth", "User 'admin' logged in.");

    // Worker threads report into the same sink through their own handles.
    println!("Spawning two workers that log concurrently...");
    thread::scope(|scope| {
        for worker in ["ingest", "billing"] {
            scope.spawn(move || {
                let log = get_instance(EventLog::new);
                for step in 1..=3 {
                    log.record(worker, format!("step {step} done"));
                    thread::sleep(Duration::from_millis(2));
                }
            });
        }
    });
    system_log.record("system", "All workers finished.");

    // One unified timeline, in the order events were committed.
    println!("\nUnified timeline ({} events):", system_log.len());
    for entry in system_log.entries() {
        println!("  {entry}");
    }

    println!("\nChecking referential integrity...");
    if Arc::ptr_eq(&system_log, &auth_log) {
        println!("{}", "✓ Both subsystem loggers are the same instance".green());
    } else {
        println!("{}", "✗ Duplicate logger instances detected".red());
    }

    println!("\n=== Key Points ===");
    println!("1. Every subsystem writes into one shared, ordered timeline");
    println!("2. The timestamp is taken under the lock, so order never lies");
    println!("3. Threads need no coordination beyond fetching the instance");
    println!("4. Snapshots are copies; readers never block the writers long");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_come_out_in_commit_order() {
        let log = EventLog::new();
        log.record("a", "first");
        log.record("b", "second");
        log.record("a", "third");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
        assert_eq!(entries[2].message, "third");
    }

    #[test]
    fn elapsed_never_runs_backwards() {
        let log = EventLog::new();
        for step in 0..5 {
            log.record("ticker", format!("tick {step}"));
        }

        let entries = log.entries();
        for pair in entries.windows(2) {
            assert!(pair[0].elapsed <= pair[1].elapsed);
        }
    }

    #[test]
    fn concurrent_writers_lose_no_entries() {
        let log = EventLog::new();
        thread::scope(|scope| {
            for worker in ["alpha", "beta", "gamma"] {
                let log = &log;
                scope.spawn(move || {
                    for step in 0..10 {
                        log.record(worker, format!("step {step}"));
                    }
                });
            }
        });

        assert_eq!(log.len(), 30);
        let entries = log.entries();
        for worker in ["alpha", "beta", "gamma"] {
            let reported = entries.iter().filter(|e| e.source == worker).count();
            assert_eq!(reported, 10, "lost entries from {worker}");
        }
    }

    #[test]
    fn snapshot_is_detached_from_the_live_log() {
        let log = EventLog::new();
        log.record("system", "only entry");

        let snapshot = log.entries();
        log.record("system", "later entry");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn entry_rendering_names_source_and_message() {
        let entry = LogEntry {
            elapsed: Duration::from_millis(1500),
            source: String::from("auth"),
            message: String::from("session opened"),
        };
        assert_eq!(entry.to_string(), "[+1.500s] auth: session opened");
    }
}
