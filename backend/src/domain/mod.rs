//! Domain primitives, use cases and the reconciliation worker.
//!
//! Purpose: keep the ledger rules (money arithmetic, order ownership, balance
//! guards, accrual reconciliation) independent of HTTP, SQL and the accrual
//! wire format. Adapters talk to the domain only through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure payload.
//! - Money: point amounts in integer minor units.
//! - Order, OrderNumber, OrderStatus: purchase orders and their lifecycle.
//! - Balance, BalanceAdjustment: per-user ledger state and its mutations.
//! - Withdrawal, NewWithdrawal: recorded point spending.
//! - OrderService, BalanceService, WithdrawalService, UserService: use-case
//!   services.
//! - AccrualReconciliationWorker: background accrual polling.

pub mod accrual_reconciliation;
pub mod balance;
pub mod balance_service;
pub mod error;
pub mod luhn;
pub mod money;
pub mod order;
pub mod order_service;
pub mod ports;
pub mod user;
pub mod user_service;
pub mod withdrawal;
pub mod withdrawal_service;

pub use self::accrual_reconciliation::{
    AccrualReconciliationConfig, AccrualReconciliationPorts, AccrualReconciliationRuntime,
    AccrualReconciliationWorker, AttemptJitter, BackoffJitter, ReconciliationSleeper,
    ReconciliationTask, TickReport, TokioSleeper,
};
pub use self::balance::{Balance, BalanceAdjustment};
pub use self::balance_service::BalanceService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::money::{Money, MoneyParseError};
pub use self::order::{Order, OrderNumber, OrderStatus, OrderTransition, OrderValidationError};
pub use self::order_service::OrderService;
pub use self::user::{Login, NewUser, User, UserId, UserValidationError};
pub use self::user_service::UserService;
pub use self::withdrawal::{NewWithdrawal, Withdrawal};
pub use self::withdrawal_service::WithdrawalService;

/// Convenient use-case result alias.
///
/// # Examples
/// ```
/// use gophermart::domain::{Error, LedgerResult, Money};
///
/// fn require_positive(sum: Money) -> LedgerResult<Money> {
///     if sum.is_positive() {
///         Ok(sum)
///     } else {
///         Err(Error::invalid_request("sum must be positive"))
///     }
/// }
///
/// assert!(require_positive(Money::ZERO).is_err());
/// ```
pub type LedgerResult<T> = Result<T, Error>;
