//! Driving port for order submission.
//!
//! Inbound adapters hand over the raw number exactly as the user sent it; the
//! use case owns validation and the duplicate rules.

use async_trait::async_trait;

use crate::domain::{Error, Order, OrderNumber, UserId};

/// Domain use-case port for submitting purchase orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCommand: Send + Sync {
    /// Register `number` for accrual on behalf of `user_id`.
    ///
    /// Fails with `InvalidFormat` when the number fails check-digit
    /// validation, `AlreadyUploaded` when the same user submitted it before
    /// (a benign duplicate), and `OwnedByAnother` when a different user owns
    /// it.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use gophermart::domain::{OrderStatus, UserId};
    /// # use gophermart::domain::ports::{FixtureOrderCommand, OrderCommand};
    /// # async fn example() -> Result<(), gophermart::domain::Error> {
    /// let order = FixtureOrderCommand
    ///     .create_order(UserId::new(1), "79927398713")
    ///     .await?;
    /// assert_eq!(order.status, OrderStatus::New);
    /// # Ok(())
    /// # }
    /// ```
    async fn create_order(&self, user_id: UserId, number: &str) -> Result<Order, Error>;
}

/// Fixture command accepting every valid number without storing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderCommand;

#[async_trait]
impl OrderCommand for FixtureOrderCommand {
    async fn create_order(&self, user_id: UserId, number: &str) -> Result<Order, Error> {
        let number =
            OrderNumber::new(number).map_err(|err| Error::invalid_format(err.to_string()))?;
        Ok(Order::submitted(number, user_id, chrono::Utc::now()))
    }
}
