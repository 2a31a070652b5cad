//! Stateless authentication tokens.
//!
//! Tokens bind a username and an expiry instant and are authenticated with a
//! server-held symmetric key, so verification needs no session storage.
//!
//! - [`TokenMaker`] - issuing and verifying contract
//! - [`PasetoMaker`] - `v2.local` implementation (XChaCha20-Poly1305)
//! - [`TokenPayload`] - the claims carried inside a token

pub mod paseto_maker;
pub mod payload;

pub use paseto_maker::{PasetoMaker, SYMMETRIC_KEY_SIZE};
pub use payload::TokenPayload;

use chrono::Duration;
use thiserror::Error;

/// Token issuance and verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid key size: must be exactly {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    /// Authentication failed, the format is wrong, or the key differs.
    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token duration is out of range")]
    InvalidDuration,

    #[error("failed to create token: {0}")]
    Encoding(String),
}

/// Issues and verifies access tokens.
///
/// Implementations must be cheap to share between request tasks.
#[cfg_attr(test, mockall::automock)]
pub trait TokenMaker: Send + Sync {
    /// Creates a token for `username` valid for `duration` from now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidDuration`] if the expiry overflows, or
    /// [`TokenError::Encoding`] if sealing fails.
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError>;

    /// Authenticates `token` and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if the token was tampered with,
    /// is malformed or was sealed with another key, and
    /// [`TokenError::ExpiredToken`] once its expiry has passed.
    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError>;
}
