//! Balance read use case.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{BalanceQuery, BalanceRepository, BalanceRepositoryError};
use crate::domain::{Balance, Error, UserId};

pub(crate) fn map_balance_repository_error(error: BalanceRepositoryError) -> Error {
    match error {
        BalanceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("balance repository unavailable: {message}"))
        }
        BalanceRepositoryError::Query { message } => {
            Error::internal(format!("balance repository error: {message}"))
        }
        BalanceRepositoryError::InsufficientBalance { user_id } => {
            Error::insufficient_balance(format!("balance of user {user_id} is too low"))
        }
    }
}

/// Balance service implementing [`BalanceQuery`].
pub struct BalanceService<R: ?Sized> {
    balances: Arc<R>,
}

impl<R: ?Sized> BalanceService<R> {
    /// Create a service over the balance repository.
    pub fn new(balances: Arc<R>) -> Self {
        Self { balances }
    }
}

#[async_trait]
impl<R> BalanceQuery for BalanceService<R>
where
    R: BalanceRepository + ?Sized,
{
    async fn get_balance(&self, user_id: UserId) -> Result<Balance, Error> {
        let balance = self
            .balances
            .find(user_id)
            .await
            .map_err(map_balance_repository_error)?;
        Ok(balance.unwrap_or(Balance::ZERO))
    }
}
