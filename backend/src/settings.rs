//! Service configuration loaded via OrthoConfig.
//!
//! Values layer CLI flags over `GOPHERMART_*` environment variables over a
//! configuration file. Every field is optional; accessors apply defaults.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::AccrualReconciliationConfig;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://localhost:8081";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_ACCRUAL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ACCRUAL_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_ACCRUAL_INITIAL_BACKOFF_MS: u64 = 2_000;
const DEFAULT_ACCRUAL_MAX_BACKOFF_MS: u64 = 10_000;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

fn millis(value: Option<u64>, default: u64) -> Duration {
    Duration::from_millis(value.unwrap_or(default))
}

/// Configuration for the ledger service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GOPHERMART")]
pub struct GophermartSettings {
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_uri: Option<String>,
    /// Base URL of the accrual service.
    pub accrual_system_address: Option<String>,
    /// Pause between reconciliation ticks, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Deadline for a single accrual lookup, in milliseconds.
    pub accrual_timeout_ms: Option<u64>,
    /// Lookup attempts per order and tick, including the first call.
    pub accrual_max_attempts: Option<u32>,
    /// Backoff before the first lookup retry, in milliseconds.
    pub accrual_initial_backoff_ms: Option<u64>,
    /// Backoff cap, in milliseconds.
    pub accrual_max_backoff_ms: Option<u64>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
}

impl GophermartSettings {
    /// Configured database URI, if any. Blank values count as unset.
    pub fn database_uri(&self) -> Option<&str> {
        self.database_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// Pool configuration when a database is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_uri().map(|uri| {
            PoolConfig::new(uri).with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
        })
    }

    /// Parsed accrual service base URL.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured address is not a URL.
    pub fn accrual_system_address(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.accrual_system_address
                .as_deref()
                .unwrap_or(DEFAULT_ACCRUAL_SYSTEM_ADDRESS),
        )
    }

    /// Timeout applied to each accrual request.
    pub fn accrual_timeout(&self) -> Duration {
        millis(self.accrual_timeout_ms, DEFAULT_ACCRUAL_TIMEOUT_MS)
    }

    /// Reconciliation worker configuration. Zero attempts are raised to one.
    pub fn reconciliation_config(&self) -> AccrualReconciliationConfig {
        AccrualReconciliationConfig {
            poll_interval: millis(self.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS),
            lookup_timeout: self.accrual_timeout(),
            max_attempts: self
                .accrual_max_attempts
                .unwrap_or(DEFAULT_ACCRUAL_MAX_ATTEMPTS)
                .max(1),
            initial_backoff: millis(
                self.accrual_initial_backoff_ms,
                DEFAULT_ACCRUAL_INITIAL_BACKOFF_MS,
            ),
            max_backoff: millis(self.accrual_max_backoff_ms, DEFAULT_ACCRUAL_MAX_BACKOFF_MS),
        }
    }
}
