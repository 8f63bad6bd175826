//! Shared counter with an ordered increment history.
//!
//! The counter is the workload the stress harness throws threads at: every
//! increment bumps the value and appends a history record in one critical
//! section, so the history always mirrors the committed increments exactly.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Identifies the worker thread that committed an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// One committed increment: the counter value it produced and who did it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncrementRecord {
    pub value: u64,
    pub worker: WorkerId,
}

#[derive(Default)]
struct CounterState {
    value: u64,
    history: Vec<IncrementRecord>,
}

/// A counter whose value and history move together.
///
/// Both live behind one `Mutex`, so an increment is never visible without
/// its history record and the records commit in increment order.
#[derive(Default)]
pub struct SharedCounter {
    state: Mutex<CounterState>,
}

impl SharedCounter {
    /// Creates a counter at zero with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the counter and records `(new value, worker)` in the
    /// history, all inside a single critical section. Returns the new value.
    pub fn increment(&self, worker: WorkerId) -> u64 {
        let mut state = self.lock();
        state.value += 1;
        let value = state.value;
        state.history.push(IncrementRecord { value, worker });
        value
    }

    /// Current counter value.
    pub fn value(&self) -> u64 {
        self.lock().value
    }

    /// Number of committed increments.
    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    /// Whether no increment has committed yet.
    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }

    /// Zeroes the value and clears the history atomically.
    ///
    /// Takes the same lock as `increment`, so a reset waits for any
    /// in-flight increment to commit and can never tear one apart.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.value = 0;
        state.history.clear();
    }

    /// A snapshot copy of the history in commit order. Callers never see
    /// the live sequence, so iterating is safe while workers keep going.
    pub fn history(&self) -> Vec<IncrementRecord> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CounterState> {
        // A panic while holding the lock leaves the state consistent
        // (value and history update together), so recover and continue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn increment_returns_running_value() {
        let counter = SharedCounter::new();
        assert_eq!(counter.increment(WorkerId(1)), 1);
        assert_eq!(counter.increment(WorkerId(2)), 2);
        assert_eq!(counter.increment(WorkerId(1)), 3);
        assert_eq!(counter.value(), 3);
    }

    #[test]
    fn history_tracks_value_and_worker() {
        let counter = SharedCounter::new();
        counter.increment(WorkerId(5));
        counter.increment(WorkerId(9));

        let history = counter.history();
        assert_eq!(
            history,
            vec![
                IncrementRecord { value: 1, worker: WorkerId(5) },
                IncrementRecord { value: 2, worker: WorkerId(9) },
            ]
        );
        assert_eq!(history.len(), counter.value() as usize);
    }

    #[test]
    fn snapshot_is_detached_from_live_history() {
        let counter = SharedCounter::new();
        counter.increment(WorkerId(1));
        let snapshot = counter.history();

        counter.increment(WorkerId(2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn reset_is_idempotent() {
        let counter = SharedCounter::new();
        for _ in 0..10 {
            counter.increment(WorkerId(3));
        }

        counter.reset();
        assert_eq!(counter.value(), 0);
        assert!(counter.history().is_empty());

        // Resetting an already clean counter changes nothing.
        counter.reset();
        assert_eq!(counter.value(), 0);
        assert!(counter.is_empty());
    }

    #[test]
    fn concurrent_increments_lose_nothing() {
        let counter = SharedCounter::new();

        thread::scope(|scope| {
            for worker in 1..=4 {
                let counter = &counter;
                scope.spawn(move || {
                    for _ in 0..250 {
                        counter.increment(WorkerId(worker));
                    }
                });
            }
        });

        assert_eq!(counter.value(), 1000);
        let history = counter.history();
        assert_eq!(history.len(), 1000);
        // Commit order means the values are exactly 1..=1000.
        for (index, record) in history.iter().enumerate() {
            assert_eq!(record.value, index as u64 + 1);
        }
    }

    #[test]
    fn worker_id_display() {
        assert_eq!(WorkerId(7).to_string(), "worker-7");
    }
}
