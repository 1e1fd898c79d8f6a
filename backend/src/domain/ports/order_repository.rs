//! Driven port for purchase order persistence.
//!
//! Besides plain create/read operations the port owns the one write the
//! reconciliation loop performs: a status change that, for processed orders,
//! credits the owner's balance in the same atomic unit.

use async_trait::async_trait;

use crate::domain::{Order, OrderNumber, OrderTransition, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
        /// An order with the same number already exists.
        DuplicateNumber { number: String } => "order {number} already exists",
    }
}

/// Result of [`OrderRepository::update_status_and_credit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The order was still open; status (and credit) were written.
    Applied,
    /// The order had already reached a terminal state; nothing was written.
    AlreadySettled,
}

/// Port for storing and reconciling purchase orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fetch an order by its globally unique number.
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Insert a new order.
    ///
    /// Returns [`OrderRepositoryError::DuplicateNumber`] when the number is
    /// already taken, whoever owns it.
    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError>;

    /// List a user's orders, oldest upload first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderRepositoryError>;

    /// List orders whose status is `NEW` or `PROCESSING`.
    async fn list_open(&self) -> Result<Vec<Order>, OrderRepositoryError>;

    /// Apply `transition` to an open order.
    ///
    /// The write only happens while the stored status is still open. For
    /// [`OrderTransition::Processed`] the accrual is stored and the owner's
    /// balance is credited in the same atomic unit, so the credit happens at
    /// most once per order.
    async fn update_status_and_credit(
        &self,
        number: &OrderNumber,
        transition: OrderTransition,
    ) -> Result<TransitionOutcome, OrderRepositoryError>;
}

/// Fixture implementation for tests that do not exercise order storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn find_by_number(
        &self,
        _number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn create(&self, _order: &Order) -> Result<(), OrderRepositoryError> {
        Ok(())
    }

    async fn list_by_user(&self, _user_id: UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_open(&self) -> Result<Vec<Order>, OrderRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_status_and_credit(
        &self,
        _number: &OrderNumber,
        _transition: OrderTransition,
    ) -> Result<TransitionOutcome, OrderRepositoryError> {
        Ok(TransitionOutcome::AlreadySettled)
    }
}
