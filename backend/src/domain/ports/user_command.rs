//! Driving port for user registration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, User};

/// Registration request as received from an inbound adapter.
///
/// `password_hash` is already hashed by the caller; the ledger stores it
/// verbatim and never sees the plain password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub login: String,
    pub password_hash: String,
}

/// Domain use-case port for registering users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserCommand: Send + Sync {
    /// Register a new user and return it with its assigned identifier.
    ///
    /// Fails with `InvalidRequest` for a blank or padded login or an empty
    /// password hash, and `LoginTaken` when the login is already registered.
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error>;
}

/// Fixture command for a store where every login is taken.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserCommand;

#[async_trait]
impl UserCommand for FixtureUserCommand {
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error> {
        Err(Error::login_taken(format!(
            "login {} is already taken",
            request.login
        )))
    }
}
