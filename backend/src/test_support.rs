//! Test utilities for the gophermart crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

pub mod reconciliation;

pub use reconciliation::{
    AttemptOffsetJitter, CancellingSleeper, MutableClock, NoJitter, RecordingSleeper,
    ScriptedAccrualSource,
};
