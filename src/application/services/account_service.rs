//! Account opening, lookup and ownership checks.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{Account, NewAccount};
use crate::domain::repositories::AccountRepository;
use crate::error::AppError;

/// Service for opening accounts and reading them on behalf of their owner.
pub struct AccountService<R: AccountRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: AccountRepository + ?Sized> AccountService<R> {
    /// Creates a new account service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Opens an empty account for `owner` in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the owner already has an account in
    /// this currency.
    /// Returns [`AppError::Forbidden`] if the owner does not exist.
    pub async fn create_account(&self, owner: &str, currency: &str) -> Result<Account, AppError> {
        let account = self
            .repository
            .create(NewAccount {
                owner: owner.to_string(),
                balance: 0,
                currency: currency.to_string(),
            })
            .await?;

        tracing::info!(account_id = account.id, owner, currency, "Account opened");

        Ok(account)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no account has this id.
    pub async fn get_account(&self, id: i64) -> Result<Account, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found", json!({ "account_id": id })))
    }

    /// Finds an account and checks that `username` owns it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no account has this id.
    /// Returns [`AppError::Forbidden`] if another user owns it.
    pub async fn get_owned_account(&self, id: i64, username: &str) -> Result<Account, AppError> {
        let account = self.get_account(id).await?;

        if !account.is_owned_by(username) {
            return Err(AppError::forbidden(
                "Account doesn't belong to the authenticated user",
                json!({ "account_id": id }),
            ));
        }

        Ok(account)
    }

    /// Finds an account and checks that it holds `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no account has this id.
    /// Returns [`AppError::Validation`] on a currency mismatch.
    pub async fn get_account_in_currency(
        &self,
        id: i64,
        currency: &str,
    ) -> Result<Account, AppError> {
        let account = self.get_account(id).await?;

        if account.currency != currency {
            return Err(AppError::bad_request(
                "Currency mismatch",
                json!({
                    "account_id": id,
                    "account_currency": account.currency,
                    "requested_currency": currency,
                }),
            ));
        }

        Ok(account)
    }

    /// Lists the owner's accounts, one page at a time.
    ///
    /// `page_id` starts at 1.
    pub async fn list_accounts(
        &self,
        owner: &str,
        page_id: i64,
        page_size: i64,
    ) -> Result<Vec<Account>, AppError> {
        let offset = (page_id - 1) * page_size;
        self.repository.list_by_owner(owner, page_size, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockAccountRepository;
    use chrono::Utc;

    fn account(id: i64, owner: &str, currency: &str) -> Account {
        Account::new(id, owner.to_string(), 0, currency.to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_create_account_starts_at_zero() {
        let mut repo = MockAccountRepository::new();
        repo.expect_create()
            .withf(|new_account| {
                new_account.owner == "alice"
                    && new_account.balance == 0
                    && new_account.currency == "USD"
            })
            .times(1)
            .returning(|new_account| {
                Ok(account(1, &new_account.owner, &new_account.currency))
            });

        let service = AccountService::new(Arc::new(repo));
        let created = service.create_account("alice", "USD").await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.balance, 0);
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repo));

        assert!(matches!(
            service.get_account(42).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_owned_account_rejects_other_owner() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(account(id, "bob", "USD"))));

        let service = AccountService::new(Arc::new(repo));

        assert!(matches!(
            service.get_owned_account(1, "alice").await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(service.get_owned_account(1, "bob").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_account_in_currency() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(account(id, "alice", "EUR"))));

        let service = AccountService::new(Arc::new(repo));

        assert!(service.get_account_in_currency(1, "EUR").await.is_ok());
        assert!(matches!(
            service.get_account_in_currency(1, "USD").await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_accounts_computes_offset() {
        let mut repo = MockAccountRepository::new();
        repo.expect_list_by_owner()
            .withf(|owner, limit, offset| owner == "alice" && *limit == 5 && *offset == 10)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let service = AccountService::new(Arc::new(repo));
        let accounts = service.list_accounts("alice", 3, 5).await.unwrap();

        assert!(accounts.is_empty());
    }
}
