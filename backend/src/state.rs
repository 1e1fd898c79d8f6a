//! Use-case dependency bundle for an inbound adapter.
//!
//! An HTTP layer holds [`LoyaltyState`] and only ever talks to the driving
//! ports it exposes, so handlers stay testable with the port fixtures.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    BalanceQuery, BalanceRepository, OrderCommand, OrderQuery, OrderRepository, UserCommand,
    UserRepository, WithdrawalCommand, WithdrawalQuery, WithdrawalRepository,
};
use crate::domain::{BalanceService, OrderService, UserService, WithdrawalService};
use crate::outbound::memory::InMemoryLedgerStore;
use crate::outbound::persistence::{
    DbPool, DieselBalanceRepository, DieselOrderRepository, DieselUserRepository,
    DieselWithdrawalRepository, PoolError,
};
use crate::settings::GophermartSettings;

/// Driven ports shared by the use cases and the reconciliation worker.
#[derive(Clone)]
pub struct LedgerRepositories {
    pub orders: Arc<dyn OrderRepository>,
    pub balances: Arc<dyn BalanceRepository>,
    pub withdrawals: Arc<dyn WithdrawalRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl LedgerRepositories {
    /// All four stores backed by one process-local ledger.
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryLedgerStore::new()))
    }

    /// All four stores backed by the given in-memory ledger.
    pub fn from_store(store: Arc<InMemoryLedgerStore>) -> Self {
        Self {
            orders: store.clone(),
            balances: store.clone(),
            withdrawals: store.clone(),
            users: store,
        }
    }

    /// Stores selected by `settings`: PostgreSQL when a database URI is
    /// configured, the in-memory ledger otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] when the PostgreSQL pool cannot be built.
    pub async fn from_settings(settings: &GophermartSettings) -> Result<Self, PoolError> {
        match settings.pool_config() {
            Some(config) => {
                let pool = DbPool::new(config).await?;
                info!("using PostgreSQL ledger store");
                Ok(Self::postgres(&pool))
            }
            None => {
                warn!("no database configured; ledger state will not survive a restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// PostgreSQL stores sharing one connection pool.
    pub fn postgres(pool: &DbPool) -> Self {
        Self {
            orders: Arc::new(DieselOrderRepository::new(pool.clone())),
            balances: Arc::new(DieselBalanceRepository::new(pool.clone())),
            withdrawals: Arc::new(DieselWithdrawalRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
        }
    }
}

/// Driving ports consumed by an inbound adapter.
#[derive(Clone)]
pub struct LoyaltyState {
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub balance: Arc<dyn BalanceQuery>,
    pub withdrawals: Arc<dyn WithdrawalCommand>,
    pub withdrawals_query: Arc<dyn WithdrawalQuery>,
    pub users: Arc<dyn UserCommand>,
}

impl LoyaltyState {
    /// Wire the ledger services over `repositories`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use gophermart::state::{LedgerRepositories, LoyaltyState};
    /// use mockable::DefaultClock;
    ///
    /// let state = LoyaltyState::new(&LedgerRepositories::in_memory(), Arc::new(DefaultClock));
    /// let _balance = state.balance.clone();
    /// ```
    pub fn new(repositories: &LedgerRepositories, clock: Arc<dyn Clock>) -> Self {
        let orders = Arc::new(OrderService::new(
            repositories.orders.clone(),
            clock.clone(),
        ));
        let withdrawals = Arc::new(WithdrawalService::new(
            repositories.balances.clone(),
            repositories.withdrawals.clone(),
            clock.clone(),
        ));

        Self {
            orders: orders.clone(),
            orders_query: orders,
            balance: Arc::new(BalanceService::new(repositories.balances.clone())),
            withdrawals: withdrawals.clone(),
            withdrawals_query: withdrawals,
            users: Arc::new(UserService::new(repositories.users.clone(), clock)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{RegistrationRequest, WithdrawalRequest};
    use crate::domain::{ErrorCode, Money};
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .single()
            .expect("valid time");
        Arc::new(MutableClock::new(now))
    }

    fn registration(login: &str) -> RegistrationRequest {
        RegistrationRequest {
            login: login.to_owned(),
            password_hash: "$2a$10$N9qo8uLOickgx2ZMRZoMye".to_owned(),
        }
    }

    fn unconfigured_settings() -> GophermartSettings {
        GophermartSettings {
            database_uri: Some("  ".to_owned()),
            accrual_system_address: None,
            poll_interval_ms: None,
            accrual_timeout_ms: None,
            accrual_max_attempts: None,
            accrual_initial_backoff_ms: None,
            accrual_max_backoff_ms: None,
            pool_max_size: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn in_memory_state_shares_one_ledger(clock: Arc<MutableClock>) {
        let repositories = LedgerRepositories::in_memory();
        let state = LoyaltyState::new(&repositories, clock);
        let user = state
            .users
            .register(registration("ada"))
            .await
            .expect("user registered")
            .id;

        state
            .orders
            .create_order(user, "79927398713")
            .await
            .expect("order accepted");
        let listed = state.orders_query.list_orders(user).await.expect("orders");
        let refused = state
            .withdrawals
            .withdraw(
                user,
                WithdrawalRequest {
                    order: "2377225624".to_owned(),
                    sum: Money::from_minor_units(100),
                },
            )
            .await
            .expect_err("nothing credited yet");

        assert_eq!(listed.len(), 1);
        assert_eq!(refused.code(), ErrorCode::InsufficientBalance);
        assert!(
            repositories
                .orders
                .list_open()
                .await
                .expect("open orders")
                .iter()
                .any(|order| order.number.as_ref() == "79927398713")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn registration_goes_through_the_shared_user_store(clock: Arc<MutableClock>) {
        let repositories = LedgerRepositories::in_memory();
        let state = LoyaltyState::new(&repositories, clock);

        let user = state
            .users
            .register(registration("ada"))
            .await
            .expect("user registered");
        let duplicate = state
            .users
            .register(registration("ada"))
            .await
            .expect_err("login taken");
        let stored = repositories
            .users
            .find_by_login(&user.login)
            .await
            .expect("user lookup");

        assert_eq!(duplicate.code(), ErrorCode::LoginTaken);
        assert_eq!(stored, Some(user));
    }

    #[rstest]
    #[tokio::test]
    async fn settings_without_database_select_the_memory_store(clock: Arc<MutableClock>) {
        let repositories = LedgerRepositories::from_settings(&unconfigured_settings())
            .await
            .expect("memory store needs no pool");
        let state = LoyaltyState::new(&repositories, clock);

        let user = state
            .users
            .register(registration("grace"))
            .await
            .expect("user registered");
        let order = state
            .orders
            .create_order(user.id, "79927398713")
            .await
            .expect("order accepted");

        assert_eq!(order.user_id, user.id);
    }
}
