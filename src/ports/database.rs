use uuid::Uuid;

use crate::domain::{DrawResult, Ledger, PointTransaction, UserPointAccount};

/// Persistent store for draws, accounts and transactions
///
/// `find_*` methods return the most recent records first.
#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort {
    async fn save_draw_result(&self, result: DrawResult) -> Result<DrawResult, Error>;
    async fn find_draw_results_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<DrawResult>, Error>;

    async fn get_user_account(&self, user_id: Uuid) -> Result<UserPointAccount, Error>;
    async fn create_user_account(
        &self,
        account: UserPointAccount,
    ) -> Result<UserPointAccount, Error>;
    /// Conditional update of an account
    ///
    /// The update only succeeds if the stored account still has the same `version` as the one
    /// passed in. The returned account carries the new version.
    async fn update_user_account(
        &self,
        account: UserPointAccount,
    ) -> Result<UserPointAccount, Error>;

    async fn save_transaction(
        &self,
        transaction: PointTransaction,
    ) -> Result<PointTransaction, Error>;
    async fn find_transactions_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PointTransaction>, Error>;

    /// Persist a draw and its credit as a single unit
    ///
    /// Checks that `transaction` is the credit for `result`, loads or creates the user's
    /// account, credits it through `ledger`, and stores the result, the account and the
    /// transaction together. Nothing is stored if any step fails.
    async fn record_draw(
        &self,
        result: DrawResult,
        transaction: PointTransaction,
        ledger: Ledger,
    ) -> Result<UserPointAccount, Error>;

    /// Debit the user's account through `ledger` and store the transaction as a single unit
    async fn record_spend(
        &self,
        transaction: PointTransaction,
        ledger: Ledger,
    ) -> Result<UserPointAccount, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no point account for user {0}")]
    AccountNotFound(Uuid),

    #[error("user {0} already has a point account")]
    AccountAlreadyExists(Uuid),

    /// The account changed since it was read
    #[error("account for user {user_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        user_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// The balance change was rejected by the ledger rules
    #[error("ledger error: {0}")]
    Ledger(#[from] crate::domain::Error),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
