//! Loyalty-points ledger: order submission, accrual reconciliation and
//! balance bookkeeping.

pub mod domain;
pub mod outbound;
pub mod settings;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
