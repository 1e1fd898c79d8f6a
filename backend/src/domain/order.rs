//! Purchase orders submitted for accrual.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, UserId, luhn};

/// Validation errors for [`OrderNumber`] and [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    /// The number is empty, contains non-digits, or fails the check digit.
    #[error("order number `{number}` fails check-digit validation")]
    InvalidNumber {
        /// Offending input.
        number: String,
    },
    /// The stored status label is not one of the known states.
    #[error("unknown order status `{label}`")]
    UnknownStatus {
        /// Offending label.
        label: String,
    },
}

/// Order number that has passed Luhn validation.
///
/// # Examples
/// ```
/// use gophermart::domain::OrderNumber;
///
/// let number = OrderNumber::new("79927398713").expect("valid number");
/// assert_eq!(number.as_ref(), "79927398713");
/// assert!(OrderNumber::new("79927398710").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Validate and wrap an order number.
    pub fn new(number: impl Into<String>) -> Result<Self, OrderValidationError> {
        let number = number.into();
        if luhn::validate(&number) {
            Ok(Self(number))
        } else {
            Err(OrderValidationError::InvalidNumber { number })
        }
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

/// Processing state of an order.
///
/// `New` and `Processing` are open; `Invalid` and `Processed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    /// Statuses still awaiting a definitive accrual decision.
    pub const OPEN: [Self; 2] = [Self::New, Self::Processing];

    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }

    /// Whether the reconciliation loop still polls orders in this state.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::New | Self::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderValidationError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            other => Err(OrderValidationError::UnknownStatus {
                label: other.to_owned(),
            }),
        }
    }
}

/// Stored purchase order.
///
/// ## Invariants
/// - `accrual` is zero unless `status` is [`OrderStatus::Processed`].
/// - `user_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub accrual: Money,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// A freshly submitted order: status `NEW`, no accrual.
    pub fn submitted(number: OrderNumber, user_id: UserId, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            number,
            user_id,
            status: OrderStatus::New,
            accrual: Money::ZERO,
            uploaded_at,
        }
    }
}

/// Status change applied by the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    /// The accrual service is working on the order.
    Processing,
    /// The accrual service rejected the order. Terminal.
    Invalid,
    /// The accrual service awarded `accrual`. Terminal; credits the owner.
    Processed { accrual: Money },
}

impl OrderTransition {
    /// Status written by this transition.
    pub const fn target_status(self) -> OrderStatus {
        match self {
            Self::Processing => OrderStatus::Processing,
            Self::Invalid => OrderStatus::Invalid,
            Self::Processed { .. } => OrderStatus::Processed,
        }
    }

    /// Amount credited to the owner's balance, if any.
    pub const fn credit(self) -> Money {
        match self {
            Self::Processed { accrual } => accrual,
            Self::Processing | Self::Invalid => Money::ZERO,
        }
    }
}
