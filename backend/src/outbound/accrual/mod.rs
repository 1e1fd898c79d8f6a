//! Accrual service outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `AccrualSource`
//! port.

mod dto;
mod http_source;

pub use http_source::{AccrualHttpSource, DEFAULT_RETRY_AFTER};
