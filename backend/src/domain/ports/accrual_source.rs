//! Driven port for the external accrual service.
//!
//! The domain owns the lookup result so the reconciliation worker can stay
//! adapter-agnostic; amounts arrive already converted to minor units.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Money, OrderNumber};

use super::define_port_error;

/// What the accrual service currently knows about one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualLookup {
    /// Not registered yet, or registered but not picked up.
    Unknown,
    /// Calculation in progress.
    Processing,
    /// The service will never award points for this order.
    Invalid,
    /// Calculation finished with the given award.
    Processed { accrual: Money },
}

define_port_error! {
    /// Errors surfaced while calling the accrual service.
    pub enum AccrualSourceError {
        /// Network transport failed or the service answered with a 5xx.
        Transport { message: String } =>
            "accrual transport failed: {message}",
        /// The call exceeded its deadline.
        Timeout { message: String } =>
            "accrual lookup timed out: {message}",
        /// The service asked all clients to back off.
        RateLimited { retry_after: Duration } =>
            "accrual service rate limited requests for {retry_after:?}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "accrual response decode failed: {message}",
        /// The service refused the request outright.
        Rejected { message: String } =>
            "accrual service rejected the request: {message}",
    }
}

impl AccrualSourceError {
    /// Return whether retrying the same lookup right away may help.
    ///
    /// Rate limiting is not transient: it pauses the whole loop rather than
    /// retrying one order.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Port for querying the accrual state of an order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccrualSource: Send + Sync {
    /// Look up `number` once. Retries are the caller's concern.
    async fn lookup(&self, number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError>;
}

/// Fixture source that never knows about any order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccrualSource;

#[async_trait]
impl AccrualSource for FixtureAccrualSource {
    async fn lookup(&self, _number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError> {
        Ok(AccrualLookup::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccrualSourceError::transport("connection reset"), true)]
    #[case(AccrualSourceError::timeout("5s elapsed"), true)]
    #[case(AccrualSourceError::rate_limited(Duration::from_secs(60)), false)]
    #[case(AccrualSourceError::decode("missing status"), false)]
    #[case(AccrualSourceError::rejected("404 Not Found"), false)]
    fn classifies_transient_errors(#[case] error: AccrualSourceError, #[case] transient: bool) {
        assert_eq!(error.is_transient(), transient);
    }
}
