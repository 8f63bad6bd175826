//! Worker-pool orchestration for the thread-safety stress tests.
//!
//! A [`Scenario`] says how hard to hammer the counter; [`run_scenario`]
//! spawns that many OS threads, joins them all, and checks the counter's
//! guarantees. Failures become report entries, never panics: the suite is a
//! diagnostic, not a gate.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::counter::{SharedCounter, WorkerId};

/// Configuration for one stress run against the shared counter.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub name: String,
    pub workers: usize,
    pub increments_per_worker: usize,
    /// Optional pause after each increment, widening the race window.
    pub delay: Option<Duration>,
}

impl Scenario {
    /// A scenario whose workers increment back-to-back.
    pub fn new(name: impl Into<String>, workers: usize, increments_per_worker: usize) -> Self {
        Self {
            name: name.into(),
            workers,
            increments_per_worker,
            delay: None,
        }
    }

    /// A scenario whose workers sleep `delay` between increments.
    pub fn with_delay(
        name: impl Into<String>,
        workers: usize,
        increments_per_worker: usize,
        delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            workers,
            increments_per_worker,
            delay: Some(delay),
        }
    }

    /// Total number of increments the scenario commits when nothing is lost.
    pub fn expected_total(&self) -> u64 {
        (self.workers * self.increments_per_worker) as u64
    }
}

/// Outcome of one scenario, as a plain record for reporting layers.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub expected: u64,
    pub observed_value: u64,
    pub observed_history: usize,
    pub duration: Duration,
    /// One entry per violated guarantee; empty when the scenario passed.
    pub failures: Vec<String>,
}

/// Runs one scenario to completion and verifies the counter's guarantees.
///
/// The counter is reset first so phases stay isolated. All workers are
/// spawned inside a thread scope, which joins every one of them before the
/// final state is read; no straggler can still be incrementing.
pub fn run_scenario(counter: &SharedCounter, scenario: &Scenario) -> ScenarioReport {
    counter.reset();

    let started = Instant::now();
    thread::scope(|scope| {
        for worker in 1..=scenario.workers {
            scope.spawn(move || {
                let id = WorkerId(worker);
                for _ in 0..scenario.increments_per_worker {
                    counter.increment(id);
                    if let Some(delay) = scenario.delay {
                        thread::sleep(delay);
                    }
                }
            });
        }
    });
    let duration = started.elapsed();

    let expected = scenario.expected_total();
    let observed_value = counter.value();
    let history = counter.history();

    let mut failures = Vec::new();
    if observed_value != expected {
        failures.push(format!(
            "counter ended at {observed_value}, expected {expected}"
        ));
    }
    if history.len() as u64 != expected {
        failures.push(format!(
            "history holds {} records, expected {expected}",
            history.len()
        ));
    }
    // The history must read exactly 1..=expected no matter how the
    // workers interleaved.
    if let Some((index, record)) = history
        .iter()
        .enumerate()
        .find(|(index, record)| record.value != *index as u64 + 1)
    {
        failures.push(format!(
            "history breaks at position {index}: recorded value {}, expected {}",
            record.value,
            index as u64 + 1
        ));
    }

    ScenarioReport {
        name: scenario.name.clone(),
        passed: failures.is_empty(),
        expected,
        observed_value,
        observed_history: history.len(),
        duration,
        failures,
    }
}

/// Accumulated totals over a suite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Runs scenarios against one shared counter and keeps every report.
///
/// A failing scenario is recorded and the suite moves on; nothing here
/// aborts the process.
pub struct ScenarioSuite {
    counter: Arc<SharedCounter>,
    reports: Vec<ScenarioReport>,
}

impl ScenarioSuite {
    /// Builds a suite around an already-shared counter (typically the one
    /// handed out by the instance registry).
    pub fn new(counter: Arc<SharedCounter>) -> Self {
        Self {
            counter,
            reports: Vec::new(),
        }
    }

    /// The counter the scenarios run against.
    pub fn counter(&self) -> &Arc<SharedCounter> {
        &self.counter
    }

    /// Runs one scenario, records its report, and returns a copy of it.
    pub fn run(&mut self, scenario: &Scenario) -> ScenarioReport {
        let report = run_scenario(&self.counter, scenario);
        self.reports.push(report.clone());
        report
    }

    /// Records an externally produced report (for checks that do not go
    /// through [`run_scenario`], like the registry race check).
    pub fn record(&mut self, report: ScenarioReport) {
        self.reports.push(report);
    }

    /// Every report recorded so far, in run order.
    pub fn reports(&self) -> &[ScenarioReport] {
        &self.reports
    }

    /// Whether every recorded scenario passed.
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|report| report.passed)
    }

    /// Pass/fail totals over the recorded reports.
    pub fn summary(&self) -> SuiteSummary {
        let passed = self.reports.iter().filter(|report| report.passed).count();
        SuiteSummary {
            total: self.reports.len(),
            passed,
            failed: self.reports.len() - passed,
        }
    }
}
