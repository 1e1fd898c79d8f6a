//! Driving port for reading a user's orders.

use async_trait::async_trait;

use crate::domain::{Error, Order, UserId};

/// Domain use-case port for order reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// All orders owned by `user_id`, oldest upload first. An empty list is a
    /// valid answer, not an error.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, Error>;

    /// One order owned by `user_id`.
    ///
    /// Orders owned by somebody else are reported as `NotFound`, exactly like
    /// numbers that were never submitted.
    async fn get_order(&self, user_id: UserId, number: &str) -> Result<Order, Error>;
}

/// Fixture query for a user with no orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderQuery;

#[async_trait]
impl OrderQuery for FixtureOrderQuery {
    async fn list_orders(&self, _user_id: UserId) -> Result<Vec<Order>, Error> {
        Ok(Vec::new())
    }

    async fn get_order(&self, _user_id: UserId, number: &str) -> Result<Order, Error> {
        Err(Error::not_found(format!("order {number} not found")))
    }
}
