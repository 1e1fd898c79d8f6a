//! Driving port for balance reads.

use async_trait::async_trait;

use crate::domain::{Balance, Error, UserId};

/// Domain use-case port for the balance projection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceQuery: Send + Sync {
    /// Current and withdrawn points for `user_id`; the zero balance when the
    /// user has no ledger activity yet.
    async fn get_balance(&self, user_id: UserId) -> Result<Balance, Error>;
}

/// Fixture query returning the zero balance.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBalanceQuery;

#[async_trait]
impl BalanceQuery for FixtureBalanceQuery {
    async fn get_balance(&self, _user_id: UserId) -> Result<Balance, Error> {
        Ok(Balance::ZERO)
    }
}
