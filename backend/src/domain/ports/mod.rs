//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`AccrualSource`]) are implemented by outbound
//! adapters. Driving ports (`*Command`, `*Query`) are implemented by the
//! domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod accrual_source;
mod balance_query;
mod balance_repository;
mod order_command;
mod order_query;
mod order_repository;
mod user_command;
mod user_repository;
mod withdrawal_command;
mod withdrawal_query;
mod withdrawal_repository;

#[cfg(test)]
pub use accrual_source::MockAccrualSource;
pub use accrual_source::{
    AccrualLookup, AccrualSource, AccrualSourceError, FixtureAccrualSource,
};
#[cfg(test)]
pub use balance_query::MockBalanceQuery;
pub use balance_query::{BalanceQuery, FixtureBalanceQuery};
#[cfg(test)]
pub use balance_repository::MockBalanceRepository;
pub use balance_repository::{
    BalanceRepository, BalanceRepositoryError, FixtureBalanceRepository,
};
#[cfg(test)]
pub use order_command::MockOrderCommand;
pub use order_command::{FixtureOrderCommand, OrderCommand};
#[cfg(test)]
pub use order_query::MockOrderQuery;
pub use order_query::{FixtureOrderQuery, OrderQuery};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{
    FixtureOrderRepository, OrderRepository, OrderRepositoryError, TransitionOutcome,
};
#[cfg(test)]
pub use user_command::MockUserCommand;
pub use user_command::{FixtureUserCommand, RegistrationRequest, UserCommand};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use withdrawal_command::MockWithdrawalCommand;
pub use withdrawal_command::{FixtureWithdrawalCommand, WithdrawalCommand, WithdrawalRequest};
#[cfg(test)]
pub use withdrawal_query::MockWithdrawalQuery;
pub use withdrawal_query::{FixtureWithdrawalQuery, WithdrawalQuery};
#[cfg(test)]
pub use withdrawal_repository::MockWithdrawalRepository;
pub use withdrawal_repository::{
    FixtureWithdrawalRepository, WithdrawalRepository, WithdrawalRepositoryError,
};
