//! Per-user point balance.

use serde::{Deserialize, Serialize};

use super::Money;

/// Spendable and lifetime-withdrawn points for one user.
///
/// ## Invariants
/// - Both fields are non-negative.
/// - A user without any ledger activity has the zero balance, never "missing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub current: Money,
    pub withdrawn: Money,
}

impl Balance {
    /// Balance of a user with no processed orders and no withdrawals.
    pub const ZERO: Self = Self {
        current: Money::ZERO,
        withdrawn: Money::ZERO,
    };

    /// Apply `adjustment`, returning `None` when a debit exceeds `current` or
    /// the arithmetic overflows.
    ///
    /// # Examples
    /// ```
    /// use gophermart::domain::{Balance, BalanceAdjustment, Money};
    ///
    /// let credited = Balance::ZERO
    ///     .apply(BalanceAdjustment::Credit(Money::from_minor_units(500)))
    ///     .expect("credit fits");
    /// let debited = credited
    ///     .apply(BalanceAdjustment::Debit(Money::from_minor_units(300)))
    ///     .expect("enough points");
    /// assert_eq!(debited.current.minor_units(), 200);
    /// assert_eq!(debited.withdrawn.minor_units(), 300);
    /// assert!(debited.apply(BalanceAdjustment::Debit(Money::from_minor_units(300))).is_none());
    /// ```
    pub fn apply(self, adjustment: BalanceAdjustment) -> Option<Self> {
        match adjustment {
            BalanceAdjustment::Credit(amount) => Some(Self {
                current: self.current.checked_add(amount)?,
                withdrawn: self.withdrawn,
            }),
            BalanceAdjustment::Debit(amount) => {
                if self.current < amount {
                    return None;
                }
                Some(Self {
                    current: self.current.checked_sub(amount)?,
                    withdrawn: self.withdrawn.checked_add(amount)?,
                })
            }
        }
    }
}

/// Reason-tagged change to a balance.
///
/// Credits come from processed orders; debits come from withdrawals and carry
/// the "only if `current` covers the amount" guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAdjustment {
    Credit(Money),
    Debit(Money),
}

impl BalanceAdjustment {
    /// Unsigned amount of the adjustment.
    pub const fn amount(self) -> Money {
        match self {
            Self::Credit(amount) | Self::Debit(amount) => amount,
        }
    }
}
