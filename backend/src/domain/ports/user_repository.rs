//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Login, NewUser, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The login is already registered.
        LoginTaken { login: String } => "login {login} is already taken",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by login.
    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, UserRepositoryError>;

    /// Register a user and return it with its assigned identifier.
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError>;
}
