//! PostgreSQL ledger stores using Diesel ORM.
//!
//! Each repository implements one domain port over a shared `bb8` pool of
//! `diesel-async` connections. Row structs and table definitions stay private
//! to this module.
//!
//! Balance mutations go through the single-statement primitives in
//! `balance_ledger`, so the "current never goes negative" guard is enforced
//! by PostgreSQL for every writer.
//!
//! # Example
//!
//! ```no_run
//! use gophermart::outbound::persistence::{DbPool, DieselOrderRepository, PoolConfig};
//!
//! # async fn build() -> Result<(), gophermart::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/gophermart")).await?;
//! let orders = DieselOrderRepository::new(pool);
//! # let _ = orders;
//! # Ok(())
//! # }
//! ```

mod balance_ledger;
mod diesel_balance_repository;
mod diesel_basic_error_mapping;
mod diesel_order_repository;
mod diesel_user_repository;
mod diesel_withdrawal_repository;
mod models;
mod pool;
mod schema;

pub use diesel_balance_repository::DieselBalanceRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use diesel_withdrawal_repository::DieselWithdrawalRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
