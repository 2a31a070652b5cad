//! User registration and login.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use tokio::task::JoinError;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::token::{TokenMaker, TokenPayload};
use crate::utils::password::{hash_password, verify_password};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub payload: TokenPayload,
    pub user: User,
}

/// Service for registering users and issuing access tokens.
///
/// Password hashing runs on the blocking pool since argon2 is deliberately
/// expensive.
pub struct UserService<R: UserRepository + ?Sized> {
    repository: Arc<R>,
    token_maker: Arc<dyn TokenMaker>,
    access_token_duration: Duration,
}

impl<R: UserRepository + ?Sized> UserService<R> {
    /// Creates a new user service.
    pub fn new(
        repository: Arc<R>,
        token_maker: Arc<dyn TokenMaker>,
        access_token_duration: Duration,
    ) -> Self {
        Self {
            repository,
            token_maker,
            access_token_duration,
        }
    }

    /// Registers a user with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email is taken.
    /// Returns [`AppError::Internal`] if hashing or the database fails.
    pub async fn create_user(
        &self,
        username: String,
        password: String,
        full_name: String,
        email: String,
    ) -> Result<User, AppError> {
        let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                AppError::internal("Failed to hash password", json!({}))
            })??;

        let user = self
            .repository
            .create(NewUser {
                username,
                hashed_password,
                full_name,
                email,
            })
            .await?;

        tracing::info!(username = %user.username, "User registered");

        Ok(user)
    }

    /// Checks credentials and issues an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    /// Returns [`AppError::Unauthorized`] if the password is wrong.
    /// Returns [`AppError::Internal`] if the token cannot be created.
    pub async fn login(&self, username: &str, password: String) -> Result<LoginOutcome, AppError> {
        let user = self
            .repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "username": username })))?;

        let hashed_password = user.hashed_password.clone();
        let matches = join_verification(
            tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
                .await,
        )?;

        if !matches {
            tracing::debug!(username, "Login rejected");
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Incorrect password" }),
            ));
        }

        let (access_token, payload) = self
            .token_maker
            .create_token(&user.username, self.access_token_duration)?;

        Ok(LoginOutcome {
            access_token,
            payload,
            user,
        })
    }
}

/// A verification task that panicked or was cancelled is a server fault, not
/// a wrong password.
fn join_verification(joined: Result<bool, JoinError>) -> Result<bool, AppError> {
    joined.map_err(|e| {
        tracing::error!(error = %e, "Password verification task failed");
        AppError::internal("Failed to verify password", json!({}))
    })
}
