//! Port and runtime dependency bundles for the reconciliation worker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{AccrualSource, OrderRepository};

use super::{BackoffJitter, ReconciliationSleeper};

/// Port bundle required by the reconciliation worker.
pub struct AccrualReconciliationPorts {
    /// Order store; also performs the atomic status and credit write.
    pub orders: Arc<dyn OrderRepository>,
    /// Outbound accrual service adapter.
    pub source: Arc<dyn AccrualSource>,
}

impl AccrualReconciliationPorts {
    /// Build a worker port bundle.
    pub fn new(orders: Arc<dyn OrderRepository>, source: Arc<dyn AccrualSource>) -> Self {
        Self { orders, source }
    }
}

/// Runtime helpers used for pacing and retries.
pub struct AccrualReconciliationRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn ReconciliationSleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for AccrualReconciliationRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ReconciliationSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Default jitter: keeps half of the base delay and spreads the other half
/// using the sub-second part of the clock, so the delay never exceeds `base`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let floor = base_ms / 2;
        let spread = base_ms - floor;
        let seed = u64::from(now.timestamp_subsec_nanos()).wrapping_add(u64::from(attempt));
        let extra = seed % spread.saturating_add(1);
        Duration::from_millis(floor.saturating_add(extra))
    }
}
