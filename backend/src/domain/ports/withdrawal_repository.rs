//! Driven port for withdrawal records.

use async_trait::async_trait;

use crate::domain::{NewWithdrawal, UserId, Withdrawal};

use super::define_port_error;

define_port_error! {
    /// Errors raised by withdrawal repository adapters.
    pub enum WithdrawalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "withdrawal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "withdrawal repository query failed: {message}",
        /// The user's `current` balance is below the withdrawal sum.
        InsufficientBalance { user_id: i32 } => "balance of user {user_id} cannot cover the withdrawal",
    }
}

/// Port for recording withdrawals against the ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    /// Debit the balance by `withdrawal.sum` only if `current` covers it, and
    /// insert the withdrawal record, as one atomic unit.
    ///
    /// On [`WithdrawalRepositoryError::InsufficientBalance`] nothing is
    /// written.
    async fn create(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<Withdrawal, WithdrawalRepositoryError>;

    /// List a user's withdrawals, oldest first.
    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Withdrawal>, WithdrawalRepositoryError>;
}

/// Fixture implementation for tests that never withdraw.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWithdrawalRepository;

#[async_trait]
impl WithdrawalRepository for FixtureWithdrawalRepository {
    async fn create(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<Withdrawal, WithdrawalRepositoryError> {
        Err(WithdrawalRepositoryError::insufficient_balance(
            withdrawal.user_id.get(),
        ))
    }

    async fn list_by_user(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<Withdrawal>, WithdrawalRepositoryError> {
        Ok(Vec::new())
    }
}
