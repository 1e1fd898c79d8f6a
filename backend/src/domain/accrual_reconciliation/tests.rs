//! Unit tests for accrual reconciliation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::{
    AccrualReconciliationConfig, AccrualReconciliationPorts, AccrualReconciliationRuntime,
    AccrualReconciliationWorker, TickReport,
};
use crate::domain::ports::{
    AccrualLookup, AccrualSource, AccrualSourceError, BalanceRepository, MockOrderRepository,
    OrderRepository, OrderRepositoryError, TransitionOutcome,
};
use crate::domain::{Money, Order, OrderNumber, OrderStatus, OrderTransition, UserId};
use crate::outbound::memory::InMemoryLedgerStore;
use crate::test_support::{
    AttemptOffsetJitter, CancellingSleeper, MutableClock, NoJitter, RecordingSleeper,
    ScriptedAccrualSource,
};

const ORDER: &str = "79927398713";
const OTHER_ORDER: &str = "12345678903";

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0)
        .single()
        .expect("valid time")
}

fn config() -> AccrualReconciliationConfig {
    AccrualReconciliationConfig {
        poll_interval: Duration::from_millis(250),
        lookup_timeout: Duration::from_secs(5),
        max_attempts: 4,
        initial_backoff: Duration::from_secs(2),
        max_backoff: Duration::from_secs(10),
    }
}

fn number(raw: &str) -> OrderNumber {
    OrderNumber::new(raw).expect("valid order number")
}

fn points(units: i64) -> Money {
    Money::from_minor_units(units)
}

async fn store_with_orders(
    now: DateTime<Utc>,
    orders: &[(&str, i32)],
) -> Arc<InMemoryLedgerStore> {
    let store = Arc::new(InMemoryLedgerStore::new());
    for (raw, owner) in orders {
        OrderRepository::create(
            store.as_ref(),
            &Order::submitted(number(raw), UserId::new(*owner), now),
        )
        .await
        .expect("order stored");
    }
    store
}

fn worker(
    orders: Arc<dyn OrderRepository>,
    source: Arc<dyn AccrualSource>,
    sleeper: Arc<RecordingSleeper>,
    now: DateTime<Utc>,
    config: AccrualReconciliationConfig,
) -> AccrualReconciliationWorker {
    AccrualReconciliationWorker::with_runtime(
        AccrualReconciliationPorts::new(orders, source),
        Arc::new(MutableClock::new(now)),
        AccrualReconciliationRuntime {
            sleeper,
            jitter: Arc::new(NoJitter),
        },
        config,
    )
}

async fn stored_order(store: &InMemoryLedgerStore, raw: &str) -> Order {
    store
        .find_by_number(&number(raw))
        .await
        .expect("order lookup")
        .expect("order present")
}

async fn current_balance(store: &InMemoryLedgerStore, user: i32) -> Money {
    store
        .find(UserId::new(user))
        .await
        .expect("balance lookup")
        .map(|balance| balance.current)
        .unwrap_or(Money::ZERO)
}

/// Order repository that keeps serving the first open-order snapshot, as a
/// tick working from a stale read would.
struct StaleOpenOrders {
    inner: Arc<InMemoryLedgerStore>,
    snapshot: Vec<Order>,
}

#[async_trait]
impl OrderRepository for StaleOpenOrders {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        self.inner.find_by_number(number).await
    }

    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        OrderRepository::create(self.inner.as_ref(), order).await
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        OrderRepository::list_by_user(self.inner.as_ref(), user_id).await
    }

    async fn list_open(&self) -> Result<Vec<Order>, OrderRepositoryError> {
        Ok(self.snapshot.clone())
    }

    async fn update_status_and_credit(
        &self,
        number: &OrderNumber,
        transition: OrderTransition,
    ) -> Result<TransitionOutcome, OrderRepositoryError> {
        self.inner.update_status_and_credit(number, transition).await
    }
}

/// Source that never answers.
struct SilentSource;

#[async_trait]
impl AccrualSource for SilentSource {
    async fn lookup(&self, _number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError> {
        std::future::pending().await
    }
}
