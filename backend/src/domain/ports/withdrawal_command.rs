//! Driving port for point withdrawals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Money, UserId, Withdrawal};

/// Withdrawal request as received from an inbound adapter.
///
/// `order` is the number the withdrawal is attributed to; it is validated by
/// the use case, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Money,
}

/// Domain use-case port for withdrawing points.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalCommand: Send + Sync {
    /// Debit `request.sum` from the user's balance and record the withdrawal.
    ///
    /// Fails with `InvalidFormat` for a bad order number, `InvalidRequest`
    /// for a non-positive sum, and `InsufficientBalance` when the balance
    /// cannot cover the sum. Failed withdrawals leave no trace.
    async fn withdraw(
        &self,
        user_id: UserId,
        request: WithdrawalRequest,
    ) -> Result<Withdrawal, Error>;
}

/// Fixture command for a user with nothing to withdraw.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWithdrawalCommand;

#[async_trait]
impl WithdrawalCommand for FixtureWithdrawalCommand {
    async fn withdraw(
        &self,
        _user_id: UserId,
        request: WithdrawalRequest,
    ) -> Result<Withdrawal, Error> {
        Err(Error::insufficient_balance(format!(
            "balance 0.00 cannot cover {}",
            request.sum
        )))
    }
}
