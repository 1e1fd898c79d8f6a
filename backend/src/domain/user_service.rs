//! User registration use case.
//!
//! Orders and balances reference users by id, so a user row has to exist
//! before anything else can be written for it.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{RegistrationRequest, UserCommand, UserRepository, UserRepositoryError};
use crate::domain::{Error, Login, NewUser, User};

fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::LoginTaken { login } => {
            Error::login_taken(format!("login {login} is already taken"))
        }
    }
}

/// User service implementing [`UserCommand`].
pub struct UserService<R: ?Sized> {
    users: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ?Sized> UserService<R> {
    /// Create a service over the user repository.
    pub fn new(users: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

#[async_trait]
impl<R> UserCommand for UserService<R>
where
    R: UserRepository + ?Sized,
{
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error> {
        let login =
            Login::new(request.login).map_err(|err| Error::invalid_request(err.to_string()))?;
        if request.password_hash.trim().is_empty() {
            return Err(Error::invalid_request("password hash must not be empty"));
        }

        let existing = self
            .users
            .find_by_login(&login)
            .await
            .map_err(map_user_repository_error)?;
        if existing.is_some() {
            return Err(Error::login_taken(format!("login {login} is already taken")));
        }

        // A concurrent registration can still win the unique constraint.
        let user = self
            .users
            .create(&NewUser {
                login,
                password_hash: request.password_hash,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user.id, login = %user.login, "user registered");
        Ok(user)
    }
}
