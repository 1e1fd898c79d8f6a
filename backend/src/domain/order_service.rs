//! Order submission and order read use cases.
//!
//! Submission validates the number, then binds it to its first owner. Races
//! between two concurrent submissions of the same number are settled by the
//! store's uniqueness guarantee: the loser re-reads the winner's row and
//! reports the same outcome a sequential caller would have seen.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{OrderCommand, OrderQuery, OrderRepository, OrderRepositoryError};
use crate::domain::{Error, Order, OrderNumber, UserId};

pub(crate) fn map_order_repository_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
        OrderRepositoryError::DuplicateNumber { number } => {
            Error::internal(format!("order {number} collided unexpectedly"))
        }
    }
}

fn parse_number(raw: &str) -> Result<OrderNumber, Error> {
    OrderNumber::new(raw).map_err(|err| Error::invalid_format(err.to_string()))
}

fn classify_existing(existing: &Order, user_id: UserId) -> Error {
    if existing.user_id == user_id {
        Error::already_uploaded(format!(
            "order {} was already uploaded by this user",
            existing.number
        ))
    } else {
        Error::owned_by_another(format!(
            "order {} was uploaded by another user",
            existing.number
        ))
    }
}

/// Order service implementing the order driving ports.
pub struct OrderService<R: ?Sized> {
    orders: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ?Sized> OrderService<R> {
    /// Create a service over the order repository. `clock` stamps uploads.
    pub fn new(orders: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { orders, clock }
    }
}

impl<R> OrderService<R>
where
    R: OrderRepository + ?Sized,
{
    async fn find(&self, number: &OrderNumber) -> Result<Option<Order>, Error> {
        self.orders
            .find_by_number(number)
            .await
            .map_err(map_order_repository_error)
    }
}

#[async_trait]
impl<R> OrderCommand for OrderService<R>
where
    R: OrderRepository + ?Sized,
{
    async fn create_order(&self, user_id: UserId, number: &str) -> Result<Order, Error> {
        let number = parse_number(number)?;

        if let Some(existing) = self.find(&number).await? {
            return Err(classify_existing(&existing, user_id));
        }

        let order = Order::submitted(number, user_id, self.clock.utc());
        match self.orders.create(&order).await {
            Ok(()) => {
                info!(order = %order.number, user_id = %user_id, "order submitted");
                Ok(order)
            }
            Err(OrderRepositoryError::DuplicateNumber { .. }) => {
                debug!(order = %order.number, "order inserted concurrently; re-reading owner");
                match self.find(&order.number).await? {
                    Some(existing) => Err(classify_existing(&existing, user_id)),
                    None => Err(Error::internal(format!(
                        "order {} reported as duplicate but not found",
                        order.number
                    ))),
                }
            }
            Err(error) => Err(map_order_repository_error(error)),
        }
    }
}

#[async_trait]
impl<R> OrderQuery for OrderService<R>
where
    R: OrderRepository + ?Sized,
{
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, Error> {
        let mut orders = self
            .orders
            .list_by_user(user_id)
            .await
            .map_err(map_order_repository_error)?;
        orders.sort_by_key(|order| order.uploaded_at);
        Ok(orders)
    }

    async fn get_order(&self, user_id: UserId, number: &str) -> Result<Order, Error> {
        let number = parse_number(number)?;
        self.find(&number)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| Error::not_found(format!("order {number} not found")))
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
