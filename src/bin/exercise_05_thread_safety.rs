//! Exercise 05: Thread Safety
//! Proving the registry and the shared counter hold under real contention
//!
//! Five checks run in sequence: handle identity, three counter scenarios of
//! rising contention, and a racing-construction check against the registry
//! itself. Failures are recorded and reported, never fatal.
//!
//! Run with: cargo run --bin exercise_05_thread_safety

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;

use singleton_patterns::report::{format_scenario, format_summary, suite_json};
use singleton_patterns::{
    get_instance, Scenario, ScenarioReport, ScenarioSuite, SharedCounter,
};

// =============================================================================
// Check 1: every caller gets the same counter
// =============================================================================

/// Number of distinct allocations behind a set of handles.
fn distinct_instances<T>(handles: &[&Arc<T>]) -> usize {
    let mut pointers: Vec<*const T> =
        handles.iter().map(|handle| Arc::as_ptr(handle)).collect();
    pointers.sort();
    pointers.dedup();
    pointers.len()
}

fn check_identity(suite: &mut ScenarioSuite) {
    println!("\n--- Check 1: handle identity ---");
    let started = Instant::now();

    let a = get_instance(SharedCounter::new);
    let b = get_instance(SharedCounter::new);
    let c = get_instance(SharedCounter::new);
    println!("Handle a: {:p}", Arc::as_ptr(&a));
    println!("Handle b: {:p}", Arc::as_ptr(&b));
    println!("Handle c: {:p}", Arc::as_ptr(&c));

    let distinct = distinct_instances(&[&a, &b, &c]);
    let identical = distinct == 1;
    if identical {
        println!("{}", "✓ every caller received the same instance".green());
    } else {
        println!("{}", "✗ the registry handed out different instances".red());
    }

    // For this check "value" counts distinct instances seen across the
    // three fetched handles; anything above 1 is a broken singleton.
    suite.record(ScenarioReport {
        name: String::from("handle identity"),
        passed: identical,
        expected: 1,
        observed_value: distinct as u64,
        observed_history: 3,
        duration: started.elapsed(),
        failures: if identical {
            Vec::new()
        } else {
            vec![format!("3 handles point at {distinct} distinct instances")]
        },
    });
}

// =============================================================================
// Checks 2-4: counter scenarios under rising contention
// =============================================================================

fn run_counter_scenarios(suite: &mut ScenarioSuite) {
    println!("\n--- Checks 2-4: counter scenarios ---");
    let scenarios = [
        Scenario::new("basic contention (5 x 100)", 5, 100),
        Scenario::new("heavy contention (20 x 500)", 20, 500),
        Scenario::with_delay("ordered history (3 x 50)", 3, 50, Duration::from_micros(100)),
    ];
    for scenario in &scenarios {
        let report = suite.run(scenario);
        println!("{}", format_scenario(&report));
    }

    // Peek at the ends of the last history, the way you would eyeball a log.
    let history = suite.counter().history();
    if history.len() > 10 {
        println!("  first records:");
        for record in &history[..3] {
            println!("    value {:>3} by {}", record.value, record.worker);
        }
        println!("    ...");
        println!("  last records:");
        for record in &history[history.len() - 3..] {
            println!("    value {:>3} by {}", record.value, record.worker);
        }
    }
}

// =============================================================================
// Check 5: racing callers construct exactly once
// =============================================================================

/// Deliberately slow to build, so racing callers pile up behind the first.
struct SlowTelemetry {
    label: &'static str,
}

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

fn check_racing_construction(suite: &mut ScenarioSuite) {
    println!("\n--- Check 5: racing construction ---");
    println!("3 threads race to initialize one slow singleton (10 ms factory)...");
    let started = Instant::now();

    let handles: Vec<Arc<SlowTelemetry>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..3)
            .map(|_| {
                scope.spawn(|| {
                    get_instance(|| {
                        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        SlowTelemetry { label: "expensive" }
                    })
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("racing caller panicked"))
            .collect()
    });

    let constructions = CONSTRUCTIONS.load(Ordering::SeqCst);
    let all_same = handles
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0], &pair[1]));

    let mut failures = Vec::new();
    if constructions != 1 {
        failures.push(format!("factory ran {constructions} times, expected once"));
    }
    if !all_same {
        failures.push(String::from("racing callers received different instances"));
    }

    if failures.is_empty() {
        println!(
            "{}",
            format!(
                "✓ factory ran once; all 3 callers share the '{}' instance",
                handles[0].label
            )
            .green()
        );
    } else {
        for failure in &failures {
            println!("{}", format!("✗ {failure}").red());
        }
    }

    suite.record(ScenarioReport {
        name: String::from("racing construction"),
        passed: failures.is_empty(),
        expected: 1,
        observed_value: constructions as u64,
        observed_history: handles.len(),
        duration: started.elapsed(),
        failures,
    });
}

// =============================================================================
// The suite
// =============================================================================

fn main() {
    println!("=== Exercise 05: Thread Safety ===\n");
    println!("Singleton under stress: many threads, one counter, no lost updates.");

    let counter = get_instance(SharedCounter::new);
    let mut suite = ScenarioSuite::new(counter);

    check_identity(&mut suite);
    run_counter_scenarios(&mut suite);
    check_racing_construction(&mut suite);

    println!("\n=== Final report ===");
    for report in suite.reports() {
        let verdict = if report.passed {
            "✓ PASSED".green()
        } else {
            "✗ FAILED".red()
        };
        println!("{:.<40} {}", report.name, verdict);
    }
    let summary = suite.summary();
    println!("{}", format_summary(&summary));

    // One machine-readable line for whatever wants to scrape the run.
    match suite_json(&summary, suite.reports()) {
        Ok(json) => println!("\n{json}"),
        Err(err) => println!("\ncould not serialize the suite: {err}"),
    }

    println!("\n=== Key Points ===");
    println!("1. Double-checked locking makes first access safe and later access cheap");
    println!("2. The counter's lock covers value and history together, so neither drifts");
    println!("3. Thread scopes join every worker before results are read");
    println!("4. The suite records failures instead of crashing on them");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_instance_counting_is_truthful() {
        let first = Arc::new(0_u32);
        let alias = Arc::clone(&first);
        let second = Arc::new(0_u32);
        let third = Arc::new(0_u32);

        assert_eq!(distinct_instances(&[&first, &alias]), 1);
        assert_eq!(distinct_instances(&[&first, &alias, &second]), 2);
        assert_eq!(distinct_instances(&[&first, &second, &third]), 3);
    }

    #[test]
    fn the_whole_suite_passes() {
        let counter = get_instance(SharedCounter::new);
        let mut suite = ScenarioSuite::new(counter);

        check_identity(&mut suite);
        run_counter_scenarios(&mut suite);
        check_racing_construction(&mut suite);

        assert_eq!(suite.reports().len(), 5);
        assert!(suite.all_passed(), "failing reports: {:#?}", suite.reports());
        assert_eq!(suite.reports()[0].observed_value, 1);

        let summary = suite.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 5);
        assert_eq!(summary.failed, 0);
    }
}
