//! Driven port for per-user balances.

use async_trait::async_trait;

use crate::domain::{Balance, BalanceAdjustment, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by balance repository adapters.
    pub enum BalanceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "balance repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "balance repository query failed: {message}",
        /// A guarded debit found `current` below the requested amount.
        InsufficientBalance { user_id: i32 } => "balance of user {user_id} cannot cover the debit",
    }
}

/// Port for reading and atomically adjusting balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Fetch a user's balance; `None` when the user has no ledger activity.
    async fn find(&self, user_id: UserId) -> Result<Option<Balance>, BalanceRepositoryError>;

    /// Apply a credit or guarded debit in one atomic step and return the new
    /// balance. The row is created on the first credit.
    async fn adjust(
        &self,
        user_id: UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Balance, BalanceRepositoryError>;
}

/// Fixture implementation reporting the zero balance for everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBalanceRepository;

#[async_trait]
impl BalanceRepository for FixtureBalanceRepository {
    async fn find(&self, _user_id: UserId) -> Result<Option<Balance>, BalanceRepositoryError> {
        Ok(None)
    }

    async fn adjust(
        &self,
        user_id: UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Balance, BalanceRepositoryError> {
        Balance::ZERO
            .apply(adjustment)
            .ok_or_else(|| BalanceRepositoryError::insufficient_balance(user_id.get()))
    }
}
