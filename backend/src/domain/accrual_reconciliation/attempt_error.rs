//! Why a lookup produced no usable answer during one tick.

use std::time::Duration;

use crate::domain::ports::AccrualSourceError;

pub(super) enum LookupFailure {
    /// The service asked every client to wait.
    RateLimited(Duration),
    /// Transient failures used up every attempt.
    Exhausted {
        attempts: u32,
        error: AccrualSourceError,
    },
    /// A failure that retrying would not fix.
    Rejected(AccrualSourceError),
    Cancelled,
}
