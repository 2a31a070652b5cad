//! Claims carried inside an access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenError;

/// Identity and validity window of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl TokenPayload {
    /// Builds a payload with a fresh random id, issued now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidDuration`] if `now + duration` overflows.
    pub fn new(username: &str, duration: Duration) -> Result<Self, TokenError> {
        let issued_at = Utc::now();
        let expired_at = issued_at
            .checked_add_signed(duration)
            .ok_or(TokenError::InvalidDuration)?;

        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at,
            expired_at,
        })
    }

    /// Checks the expiry against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ExpiredToken`] once `now > expired_at`.
    pub fn valid(&self) -> Result<(), TokenError> {
        if Utc::now() > self.expired_at {
            return Err(TokenError::ExpiredToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payload() {
        let payload = TokenPayload::new("alice", Duration::minutes(15)).unwrap();

        assert_eq!(payload.username, "alice");
        assert_eq!(payload.expired_at - payload.issued_at, Duration::minutes(15));
        assert!(payload.valid().is_ok());
    }

    #[test]
    fn test_payload_ids_are_unique() {
        let a = TokenPayload::new("alice", Duration::minutes(1)).unwrap();
        let b = TokenPayload::new("alice", Duration::minutes(1)).unwrap();

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_expired_payload() {
        let payload = TokenPayload::new("alice", -Duration::minutes(1)).unwrap();

        assert_eq!(payload.valid(), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_overflowing_duration() {
        let result = TokenPayload::new("alice", Duration::days(365 * 1_000_000));

        assert_eq!(result.unwrap_err(), TokenError::InvalidDuration);
    }
}
