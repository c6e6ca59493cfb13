use std::task::{Context, Poll};

use crate::{
    domain::TransactionKind,
    ports::{
        database::{DatabasePort, Error as DatabaseError},
        user::UserPort,
    },
};
use tower::Service;
use uuid::Uuid;

use super::{BoxFuture, DomainLogic, Error};

pub struct BalanceRequest {
    pub user_id: Uuid,
}

#[derive(Debug, PartialEq, Eq)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    /// Zero for users that never received points
    pub balance: i64,
}

/// Compare a stored balance and draw history with the transaction log
///
/// This only detects discrepancies, such as a draw that was stored without its credit or a credit
/// that never reached the balance. Repairing them is left to the operator.
pub struct ReconcileRequest {
    pub user_id: Uuid,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ReconcileResponse {
    pub user_id: Uuid,
    /// Balance stored on the account
    pub recorded_balance: i64,
    /// Signed sum of all transactions of the user
    pub ledger_balance: i64,
    pub transaction_count: usize,
    /// Number of stored draw results
    pub draw_count: usize,
    /// Number of draw credit transactions
    pub draw_credit_count: usize,
    /// Sum of the points of all stored draw results
    pub drawn_points: i64,
    /// Sum of all draw credit transactions
    pub credited_points: i64,
    pub consistent: bool,
}

/// Stored balance of a user, treating a missing account as empty
async fn stored_balance<D>(database: &D, user_id: Uuid) -> Result<i64, Error>
where
    D: DatabasePort + ?Sized,
{
    match database.get_user_account(user_id).await {
        Ok(account) => Ok(account.balance),
        Err(DatabaseError::AccountNotFound(_)) => Ok(0),
        Err(err) => Err(err.into()),
    }
}

impl<D, U, R> Service<BalanceRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    type Response = BalanceResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: BalanceRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            let user = logic.users.find_user(req.user_id).await?;
            let balance = stored_balance(&*logic.database, user.user_id).await?;

            Ok(BalanceResponse {
                user_id: user.user_id,
                balance,
            })
        })
    }
}

impl<D, U, R> Service<ReconcileRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    type Response = ReconcileResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ReconcileRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            let user = logic.users.find_user(req.user_id).await?;

            let recorded_balance = stored_balance(&*logic.database, user.user_id).await?;
            let transactions = logic
                .database
                .find_transactions_by_user(user.user_id, usize::MAX)
                .await?;
            let draws = logic
                .database
                .find_draw_results_by_user(user.user_id, usize::MAX)
                .await?;

            let ledger_balance = transactions.iter().map(|tx| tx.signed_amount()).sum();
            let credits: Vec<_> = transactions
                .iter()
                .filter(|tx| tx.kind == TransactionKind::DrawCredit)
                .collect();
            let credited_points = credits.iter().map(|tx| tx.amount).sum();
            let drawn_points = draws.iter().map(|result| result.points_earned).sum();

            let balance_matches = recorded_balance == ledger_balance;
            let draws_match = draws.len() == credits.len() && drawn_points == credited_points;
            if !balance_matches {
                tracing::warn!(
                    user_id = %user.user_id,
                    recorded_balance,
                    ledger_balance,
                    "balance does not match transaction log"
                );
            }
            if !draws_match {
                tracing::warn!(
                    user_id = %user.user_id,
                    draws = draws.len(),
                    credits = credits.len(),
                    drawn_points,
                    credited_points,
                    "draw history does not match draw credits"
                );
            }

            Ok(ReconcileResponse {
                user_id: user.user_id,
                recorded_balance,
                ledger_balance,
                transaction_count: transactions.len(),
                draw_count: draws.len(),
                draw_credit_count: credits.len(),
                drawn_points,
                credited_points,
                consistent: balance_matches && draws_match,
            })
        })
    }
}
