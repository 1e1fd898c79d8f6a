//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ledger stores using Diesel ORM
//! - **memory**: process-local ledger store for tests and database-less runs
//! - **accrual**: reqwest client for the external accrual service
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. Ledger guards live in SQL or
//! behind the store mutex; use-case rules stay in the domain.

pub mod accrual;
pub mod memory;
pub mod persistence;
