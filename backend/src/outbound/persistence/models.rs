//! Internal Diesel row structs for ledger tables.
//!
//! These types never leave the persistence layer. Reads decode through
//! `TryFrom` so a row that violates a domain invariant surfaces as a query
//! error instead of a silently wrong value.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Balance, Login, Money, Order, OrderNumber, OrderStatus, User, UserId, Withdrawal,
};

use super::schema::{balances, orders, users, withdrawals};

/// A stored row that no longer satisfies the domain's validation rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored {table} row is invalid: {message}")]
pub(crate) struct RowDecodeError {
    table: &'static str,
    message: String,
}

impl RowDecodeError {
    fn new(table: &'static str, message: impl ToString) -> Self {
        Self {
            table,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub login: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RowDecodeError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let login = Login::new(row.login).map_err(|err| RowDecodeError::new("users", err))?;
        Ok(Self {
            id: UserId::new(row.id),
            login,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub number: String,
    pub user_id: i32,
    pub status: String,
    pub accrual: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number.as_ref().to_owned(),
            user_id: order.user_id.get(),
            status: order.status.as_str().to_owned(),
            accrual: order.accrual.minor_units(),
            uploaded_at: order.uploaded_at,
        }
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = RowDecodeError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let number =
            OrderNumber::new(row.number).map_err(|err| RowDecodeError::new("orders", err))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|err| RowDecodeError::new("orders", err))?;
        Ok(Self {
            number,
            user_id: UserId::new(row.user_id),
            status,
            accrual: Money::from_minor_units(row.accrual),
            uploaded_at: row.uploaded_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = balances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BalanceRow {
    pub current: i64,
    pub withdrawn: i64,
}

impl From<BalanceRow> for Balance {
    fn from(row: BalanceRow) -> Self {
        Self {
            current: Money::from_minor_units(row.current),
            withdrawn: Money::from_minor_units(row.withdrawn),
        }
    }
}

// ---------------------------------------------------------------------------
// Withdrawals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = withdrawals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WithdrawalRow {
    pub id: i32,
    pub order_number: String,
    pub user_id: i32,
    pub sum: i64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = withdrawals)]
pub(crate) struct NewWithdrawalRow<'a> {
    pub order_number: &'a str,
    pub user_id: i32,
    pub sum: i64,
    pub processed_at: DateTime<Utc>,
}

impl TryFrom<WithdrawalRow> for Withdrawal {
    type Error = RowDecodeError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        let order = OrderNumber::new(row.order_number)
            .map_err(|err| RowDecodeError::new("withdrawals", err))?;
        Ok(Self {
            id: row.id,
            order,
            user_id: UserId::new(row.user_id),
            sum: Money::from_minor_units(row.sum),
            processed_at: row.processed_at,
        })
    }
}
