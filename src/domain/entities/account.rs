//! Account entity holding a balance in a single currency.

use chrono::{DateTime, Utc};

/// A balance owned by one user in one currency.
///
/// `balance` is expressed in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new Account instance.
    pub fn new(
        id: i64,
        owner: String,
        balance: i64,
        currency: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            balance,
            currency,
            created_at,
        }
    }

    /// Returns true if `username` owns this account.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner == username
    }
}

/// Input data for opening a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_creation() {
        let now = Utc::now();
        let account = Account::new(1, "alice".to_string(), 100, "USD".to_string(), now);

        assert_eq!(account.id, 1);
        assert_eq!(account.owner, "alice");
        assert_eq!(account.balance, 100);
        assert_eq!(account.currency, "USD");
        assert_eq!(account.created_at, now);
    }

    #[test]
    fn test_account_ownership() {
        let account = Account::new(7, "alice".to_string(), 0, "EUR".to_string(), Utc::now());

        assert!(account.is_owned_by("alice"));
        assert!(!account.is_owned_by("bob"));
        assert!(!account.is_owned_by("Alice"));
    }
}
