//! Withdrawal use cases.
//!
//! The balance pre-check only short-circuits obviously doomed requests. The
//! authoritative check is the guarded debit inside
//! [`WithdrawalRepository::create`], which runs in the same atomic unit as
//! the insert, so concurrent withdrawals cannot overdraw a balance.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::balance_service::map_balance_repository_error;
use crate::domain::ports::{
    BalanceRepository, WithdrawalCommand, WithdrawalQuery, WithdrawalRepository,
    WithdrawalRepositoryError, WithdrawalRequest,
};
use crate::domain::{Balance, Error, NewWithdrawal, OrderNumber, UserId, Withdrawal};

fn map_withdrawal_repository_error(error: WithdrawalRepositoryError) -> Error {
    match error {
        WithdrawalRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("withdrawal repository unavailable: {message}"))
        }
        WithdrawalRepositoryError::Query { message } => {
            Error::internal(format!("withdrawal repository error: {message}"))
        }
        WithdrawalRepositoryError::InsufficientBalance { user_id } => Error::insufficient_balance(
            format!("balance of user {user_id} cannot cover the withdrawal"),
        ),
    }
}

/// Withdrawal service implementing the withdrawal driving ports.
pub struct WithdrawalService<B: ?Sized, W: ?Sized> {
    balances: Arc<B>,
    withdrawals: Arc<W>,
    clock: Arc<dyn Clock>,
}

impl<B: ?Sized, W: ?Sized> WithdrawalService<B, W> {
    /// Create a service over the balance and withdrawal repositories.
    pub fn new(balances: Arc<B>, withdrawals: Arc<W>, clock: Arc<dyn Clock>) -> Self {
        Self {
            balances,
            withdrawals,
            clock,
        }
    }
}

#[async_trait]
impl<B, W> WithdrawalCommand for WithdrawalService<B, W>
where
    B: BalanceRepository + ?Sized,
    W: WithdrawalRepository + ?Sized,
{
    async fn withdraw(
        &self,
        user_id: UserId,
        request: WithdrawalRequest,
    ) -> Result<Withdrawal, Error> {
        let order = OrderNumber::new(request.order)
            .map_err(|err| Error::invalid_format(err.to_string()))?;
        if !request.sum.is_positive() {
            return Err(Error::invalid_request(format!(
                "withdrawal sum must be positive, got {}",
                request.sum
            )));
        }

        let balance = self
            .balances
            .find(user_id)
            .await
            .map_err(map_balance_repository_error)?
            .unwrap_or(Balance::ZERO);
        if balance.current < request.sum {
            return Err(Error::insufficient_balance(format!(
                "balance {} cannot cover {}",
                balance.current, request.sum
            )));
        }

        let withdrawal = self
            .withdrawals
            .create(&NewWithdrawal {
                order,
                user_id,
                sum: request.sum,
                processed_at: self.clock.utc(),
            })
            .await
            .map_err(map_withdrawal_repository_error)?;

        info!(
            user_id = %user_id,
            order = %withdrawal.order,
            sum = %withdrawal.sum,
            "points withdrawn"
        );
        Ok(withdrawal)
    }
}

#[async_trait]
impl<B, W> WithdrawalQuery for WithdrawalService<B, W>
where
    B: BalanceRepository + ?Sized,
    W: WithdrawalRepository + ?Sized,
{
    async fn list_withdrawals(&self, user_id: UserId) -> Result<Vec<Withdrawal>, Error> {
        let mut withdrawals = self
            .withdrawals
            .list_by_user(user_id)
            .await
            .map_err(map_withdrawal_repository_error)?;
        withdrawals.sort_by_key(|withdrawal| withdrawal.processed_at);
        Ok(withdrawals)
    }
}

#[cfg(test)]
#[path = "withdrawal_service_tests.rs"]
mod tests;
