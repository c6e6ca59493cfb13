use crate::{
    domain::{DrawResult, Ledger, PointTransaction, UserPointAccount},
    ports::database::{DatabasePort, Error},
};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, UserPointAccount>,
    /// Insertion order, oldest first
    draw_results: Vec<DrawResult>,
    /// Insertion order, oldest first
    transactions: Vec<PointTransaction>,
}

/// In-memory store
///
/// All tables live behind one lock, so multi-step writes such as [`DatabasePort::record_draw`]
/// are applied atomically.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

/// Apply a transaction to the user's account and store both
fn apply(
    tables: &mut Tables,
    ledger: &Ledger,
    transaction: &PointTransaction,
) -> Result<UserPointAccount, Error> {
    let current = tables
        .accounts
        .get(&transaction.user_id)
        .cloned()
        .unwrap_or_else(|| UserPointAccount::new(transaction.user_id));

    let mut updated = ledger.apply(&current, transaction)?;
    updated.version += 1;

    tables
        .accounts
        .insert(transaction.user_id, updated.clone());
    tables.transactions.push(transaction.clone());

    tracing::debug!(
        user_id = %updated.user_id,
        kind = transaction.kind.as_str(),
        amount = transaction.amount,
        balance = updated.balance,
        version = updated.version,
        "applied transaction"
    );
    Ok(updated)
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn save_draw_result(&self, result: DrawResult) -> Result<DrawResult, Error> {
        self.tables.lock()?.draw_results.push(result.clone());
        Ok(result)
    }

    async fn find_draw_results_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<DrawResult>, Error> {
        let results = self
            .tables
            .lock()?
            .draw_results
            .iter()
            .rev()
            .filter(|result| result.user_id == user_id)
            .take(limit)
            .cloned()
            .collect();

        Ok(results)
    }

    async fn get_user_account(&self, user_id: Uuid) -> Result<UserPointAccount, Error> {
        self.tables
            .lock()?
            .accounts
            .get(&user_id)
            .cloned()
            .ok_or(Error::AccountNotFound(user_id))
    }

    async fn create_user_account(
        &self,
        account: UserPointAccount,
    ) -> Result<UserPointAccount, Error> {
        match self.tables.lock()?.accounts.entry(account.user_id) {
            Entry::Occupied(_) => Err(Error::AccountAlreadyExists(account.user_id)),
            Entry::Vacant(entry) => Ok(entry.insert(account).clone()),
        }
    }

    async fn update_user_account(
        &self,
        account: UserPointAccount,
    ) -> Result<UserPointAccount, Error> {
        match self.tables.lock()?.accounts.entry(account.user_id) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                // Someone else wrote to the account since it was read
                if stored.version != account.version {
                    return Err(Error::VersionConflict {
                        user_id: account.user_id,
                        expected: account.version,
                        actual: stored.version,
                    });
                }

                *stored = UserPointAccount {
                    version: account.version + 1,
                    ..account
                };
                Ok(stored.clone())
            }
            Entry::Vacant(_) => Err(Error::AccountNotFound(account.user_id)),
        }
    }

    async fn save_transaction(
        &self,
        transaction: PointTransaction,
    ) -> Result<PointTransaction, Error> {
        self.tables.lock()?.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_transactions_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PointTransaction>, Error> {
        let transactions = self
            .tables
            .lock()?
            .transactions
            .iter()
            .rev()
            .filter(|transaction| transaction.user_id == user_id)
            .take(limit)
            .cloned()
            .collect();

        Ok(transactions)
    }

    async fn record_draw(
        &self,
        result: DrawResult,
        transaction: PointTransaction,
        ledger: Ledger,
    ) -> Result<UserPointAccount, Error> {
        // Ledger checks run before anything is written
        ledger.check_draw_credit(&result, &transaction)?;
        let mut tables = self.tables.lock()?;
        let account = apply(&mut tables, &ledger, &transaction)?;
        tables.draw_results.push(result);

        Ok(account)
    }

    async fn record_spend(
        &self,
        transaction: PointTransaction,
        ledger: Ledger,
    ) -> Result<UserPointAccount, Error> {
        let mut tables = self.tables.lock()?;
        apply(&mut tables, &ledger, &transaction)
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
