//! Driving port for withdrawal history.

use async_trait::async_trait;

use crate::domain::{Error, UserId, Withdrawal};

/// Domain use-case port for listing withdrawals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalQuery: Send + Sync {
    /// All withdrawals of `user_id`, oldest first.
    async fn list_withdrawals(&self, user_id: UserId) -> Result<Vec<Withdrawal>, Error>;
}

/// Fixture query with an empty history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWithdrawalQuery;

#[async_trait]
impl WithdrawalQuery for FixtureWithdrawalQuery {
    async fn list_withdrawals(&self, _user_id: UserId) -> Result<Vec<Withdrawal>, Error> {
        Ok(Vec::new())
    }
}
