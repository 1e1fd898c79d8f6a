//! Background reconciliation of open orders against the accrual service.
//!
//! Each tick lists the open orders, asks the accrual service about every one
//! of them and applies whatever definitive answer comes back. Lookups are
//! bounded by a timeout and retried with jittered exponential backoff; a
//! rate-limit answer pauses the whole loop. Crediting is delegated to
//! [`OrderRepository::update_status_and_credit`], whose "still open" guard
//! makes a repeated `PROCESSED` answer harmless.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AccrualLookup, AccrualSource, AccrualSourceError, OrderRepository, TransitionOutcome,
};
use crate::domain::{Order, OrderNumber, OrderStatus, OrderTransition};

mod attempt_error;
mod runtime;

use attempt_error::LookupFailure;
pub use runtime::{
    AccrualReconciliationPorts, AccrualReconciliationRuntime, AttemptJitter, TokioSleeper,
};

/// Tunables for polling cadence and lookup retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualReconciliationConfig {
    /// Pause between ticks when the accrual service is not throttling.
    pub poll_interval: Duration,
    /// Deadline for one accrual lookup.
    pub lookup_timeout: Duration,
    /// Lookup attempts per order and tick, including the first call.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
}

impl Default for AccrualReconciliationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            lookup_timeout: Duration::from_secs(5),
            max_attempts: 4,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Summary of one reconciliation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Open orders looked up during the tick.
    pub examined: usize,
    /// Status writes that were applied.
    pub updated: usize,
    /// Orders that reached `PROCESSED` and credited their owner.
    pub credited: usize,
    /// Orders left open because a lookup or write failed.
    pub deferred: usize,
    /// Global pause requested by the accrual service.
    pub paused_for: Option<Duration>,
}

/// Async sleeping abstraction used for backoff and tick pacing.
#[async_trait]
pub trait ReconciliationSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust
    /// use async_trait::async_trait;
    /// use gophermart::domain::ReconciliationSleeper;
    /// use std::sync::Mutex;
    /// use std::time::Duration;
    ///
    /// #[derive(Default)]
    /// struct TallySleeper(Mutex<Duration>);
    ///
    /// #[async_trait]
    /// impl ReconciliationSleeper for TallySleeper {
    ///     async fn sleep(&self, duration: Duration) {
    ///         *self.0.lock().expect("tally mutex") += duration;
    ///     }
    /// }
    ///
    /// let sleeper = TallySleeper::default();
    /// futures::executor::block_on(sleeper.sleep(Duration::from_millis(40)));
    /// assert_eq!(*sleeper.0.lock().expect("tally mutex"), Duration::from_millis(40));
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return the delay to wait before retry number `attempt`, derived from the
    /// capped exponential `base`.
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Domain-owned reconciliation worker.
pub struct AccrualReconciliationWorker {
    orders: Arc<dyn OrderRepository>,
    source: Arc<dyn AccrualSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn ReconciliationSleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: AccrualReconciliationConfig,
}

impl AccrualReconciliationWorker {
    /// Build a worker using tokio sleeping and the default jitter.
    pub fn new(
        ports: AccrualReconciliationPorts,
        clock: Arc<dyn Clock>,
        config: AccrualReconciliationConfig,
    ) -> Self {
        Self::with_runtime(
            ports,
            clock,
            AccrualReconciliationRuntime::default(),
            config,
        )
    }

    /// Build a worker with injected runtime helpers.
    pub fn with_runtime(
        ports: AccrualReconciliationPorts,
        clock: Arc<dyn Clock>,
        runtime: AccrualReconciliationRuntime,
        config: AccrualReconciliationConfig,
    ) -> Self {
        Self {
            orders: ports.orders,
            source: ports.source,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Start the loop on the tokio runtime.
    ///
    /// The returned handle owns `shutdown`; dropping the handle without
    /// calling [`ReconciliationTask::shutdown`] leaves the loop running.
    pub fn spawn(self, shutdown: CancellationToken) -> ReconciliationTask {
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { self.run(token).await });
        ReconciliationTask { shutdown, handle }
    }

    /// Run ticks until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            poll_interval = ?self.config.poll_interval,
            lookup_timeout = ?self.config.lookup_timeout,
            "accrual reconciliation started"
        );

        while !shutdown.is_cancelled() {
            let report = self.reconcile_once(&shutdown).await;
            debug!(
                examined = report.examined,
                updated = report.updated,
                credited = report.credited,
                deferred = report.deferred,
                "reconciliation tick finished"
            );

            if !self.pause(self.next_tick_delay(&report), &shutdown).await {
                break;
            }
        }

        info!("accrual reconciliation stopped");
    }

    /// Reconcile every currently open order once.
    ///
    /// Stops early when `shutdown` fires or the accrual service asks for a
    /// pause; in the latter case the pause is reported in
    /// [`TickReport::paused_for`] and the remaining orders wait for the next
    /// tick.
    pub async fn reconcile_once(&self, shutdown: &CancellationToken) -> TickReport {
        let mut report = TickReport::default();
        let open = match self.orders.list_open().await {
            Ok(open) => open,
            Err(error) => {
                warn!(error = %error, "listing open orders failed; retrying next tick");
                return report;
            }
        };

        for order in open {
            if shutdown.is_cancelled() {
                break;
            }
            report.examined += 1;

            match self.lookup_with_retry(&order.number, shutdown).await {
                Ok(lookup) => self.apply_lookup(&order, lookup, &mut report).await,
                Err(LookupFailure::RateLimited(retry_after)) => {
                    warn!(
                        order = %order.number,
                        retry_after = ?retry_after,
                        "accrual service rate limited; pausing reconciliation"
                    );
                    report.paused_for = Some(retry_after);
                    break;
                }
                Err(LookupFailure::Exhausted { attempts, error }) => {
                    warn!(
                        order = %order.number,
                        attempts,
                        error = %error,
                        "accrual lookup kept failing; order stays open"
                    );
                    report.deferred += 1;
                }
                Err(LookupFailure::Rejected(error)) => {
                    warn!(order = %order.number, error = %error, "accrual lookup failed");
                    report.deferred += 1;
                }
                Err(LookupFailure::Cancelled) => break,
            }
        }

        report
    }

    async fn apply_lookup(&self, order: &Order, lookup: AccrualLookup, report: &mut TickReport) {
        let transition = match lookup {
            AccrualLookup::Unknown => return,
            AccrualLookup::Processing if order.status == OrderStatus::Processing => return,
            AccrualLookup::Processing => OrderTransition::Processing,
            AccrualLookup::Invalid => OrderTransition::Invalid,
            AccrualLookup::Processed { accrual } if accrual.is_negative() => {
                warn!(order = %order.number, accrual = %accrual, "ignoring negative accrual");
                report.deferred += 1;
                return;
            }
            AccrualLookup::Processed { accrual } => OrderTransition::Processed { accrual },
        };

        match self
            .orders
            .update_status_and_credit(&order.number, transition)
            .await
        {
            Ok(TransitionOutcome::Applied) => {
                report.updated += 1;
                if matches!(transition, OrderTransition::Processed { .. }) {
                    report.credited += 1;
                }
                info!(
                    order = %order.number,
                    user_id = %order.user_id,
                    status = %transition.target_status(),
                    accrual = %transition.credit(),
                    "order status updated"
                );
            }
            Ok(TransitionOutcome::AlreadySettled) => {
                debug!(order = %order.number, "order already settled; nothing to apply");
            }
            Err(error) => {
                warn!(
                    order = %order.number,
                    error = %error,
                    "persisting order transition failed; order stays open"
                );
                report.deferred += 1;
            }
        }
    }

    async fn lookup_with_retry(
        &self,
        number: &OrderNumber,
        shutdown: &CancellationToken,
    ) -> Result<AccrualLookup, LookupFailure> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                () = shutdown.cancelled() => return Err(LookupFailure::Cancelled),
                result = self.lookup_once(number) => result,
            };

            match result {
                Ok(lookup) => return Ok(lookup),
                Err(AccrualSourceError::RateLimited { retry_after }) => {
                    return Err(LookupFailure::RateLimited(retry_after));
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        self.retry_base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    debug!(
                        order = %number,
                        attempt,
                        delay = ?delay,
                        error = %error,
                        "retrying accrual lookup"
                    );
                    if !self.pause(delay, shutdown).await {
                        return Err(LookupFailure::Cancelled);
                    }
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    return Err(LookupFailure::Exhausted {
                        attempts: attempt,
                        error,
                    });
                }
                Err(error) => return Err(LookupFailure::Rejected(error)),
            }
        }
    }

    async fn lookup_once(&self, number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError> {
        let timeout = self.config.lookup_timeout;
        match tokio::time::timeout(timeout, self.source.lookup(number)).await {
            Ok(result) => result,
            Err(_) => Err(AccrualSourceError::timeout(format!(
                "no answer for order {number} within {timeout:?}"
            ))),
        }
    }

    /// Sleep for `delay`; returns `false` when interrupted by `shutdown`.
    async fn pause(&self, delay: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            () = self.sleeper.sleep(delay) => true,
        }
    }

    /// Wait before the next tick: the poll interval, stretched by any
    /// rate-limit pause but never shortened by one.
    fn next_tick_delay(&self, report: &TickReport) -> Duration {
        let poll_interval = self.config.poll_interval;
        report
            .paused_for
            .map_or(poll_interval, |pause| pause.max(poll_interval))
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .initial_backoff
            .saturating_mul(factor)
            .min(self.config.max_backoff)
    }
}

/// Handle to a spawned reconciliation loop.
pub struct ReconciliationTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl ReconciliationTask {
    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Cancel the loop and wait for it to finish its current step.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.shutdown.cancel();
        self.handle.await
    }
}

#[cfg(test)]
mod tests;
