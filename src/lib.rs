//! # Singleton Patterns in Rust
//!
//! This crate demonstrates the singleton pattern the way Rust wants it
//! written: shared ownership through `Arc` and interior mutability behind
//! locks, with one registry handing every caller the same instance.
//!
//! ## Core pieces
//!
//! - [`registry`]: a thread-safe instance registry keyed by type, with
//!   double-checked locking and a process-wide global
//! - [`counter`]: a shared counter that records every increment in order,
//!   used to make races visible when the protection is taken away
//! - [`harness`]: worker-pool scenarios that hammer the counter and verify
//!   its guarantees
//! - [`report`]: console and JSON rendering for scenario outcomes
//!
//! ## Exercises
//!
//! Each exercise is a standalone binary built on these pieces:
//!
//! 1. Global configuration, one instance across modules
//! 2. Event logger, one timeline across threads
//! 3. Database connection, connect once and reuse
//! 4. Game settings, one tuning block for a whole game
//! 5. Thread safety, the stress suite that proves the registry holds
//!
//! Run them with: `cargo run --bin exercise_01_global_config` (and so on).

pub mod counter;
pub mod harness;
pub mod registry;
pub mod report;

pub use counter::{IncrementRecord, SharedCounter, WorkerId};
pub use harness::{run_scenario, Scenario, ScenarioReport, ScenarioSuite, SuiteSummary};
pub use registry::{get_instance, reset_instance, try_get_instance, InstanceRegistry};
