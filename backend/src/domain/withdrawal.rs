//! Point withdrawals attributed to an order number.
//!
//! The attributed number only has to pass check-digit validation; it need not
//! belong to a submitted purchase order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, OrderNumber, UserId};

/// Withdrawal about to be recorded. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub order: OrderNumber,
    pub user_id: UserId,
    pub sum: Money,
    pub processed_at: DateTime<Utc>,
}

/// Recorded withdrawal. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: i32,
    pub order: OrderNumber,
    pub user_id: UserId,
    pub sum: Money,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Attach a store-assigned id to a pending withdrawal.
    pub fn from_new(id: i32, new: NewWithdrawal) -> Self {
        Self {
            id,
            order: new.order,
            user_id: new.user_id,
            sum: new.sum,
            processed_at: new.processed_at,
        }
    }
}
