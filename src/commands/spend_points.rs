use std::task::{Context, Poll};

use crate::{
    domain::{PointTransaction, TransactionKind},
    ports::{database::DatabasePort, user::UserPort},
};
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use super::{BoxFuture, DomainLogic, Error};

pub struct SpendPointsRequest {
    pub user_id: Uuid,
    pub amount: i64,
    /// Defaults to "Points spent"
    pub description: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct SpendPointsResponse {
    pub transaction: PointTransaction,
    pub new_balance: i64,
}

impl<D, U, R> Service<SpendPointsRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    type Response = SpendPointsResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SpendPointsRequest) -> Self::Future {
        let logic = self.clone();
        let span = tracing::info_span!("spend_points", user_id = %req.user_id, amount = req.amount);
        Box::pin(
            async move {
                let user = logic.users.find_user(req.user_id).await?;

                let transaction = logic.ledger.record_transaction(
                    user.user_id,
                    req.amount,
                    TransactionKind::Spend,
                    req.description.unwrap_or_else(|| "Points spent".to_string()),
                )?;

                let account = logic
                    .database
                    .record_spend(transaction.clone(), logic.ledger)
                    .await
                    .map_err(|err| {
                        tracing::warn!(error = %err, "spend rejected");
                        err
                    })?;

                tracing::info!(balance = account.balance, "points spent");

                Ok(SpendPointsResponse {
                    transaction,
                    new_balance: account.balance,
                })
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{database::memory::MemoryDatabase, user::memory::MemoryUserDirectory},
        domain::{
            default_rewards, Catalog, Error as LedgerError, Ledger, ThreadRandom, UserPointAccount,
        },
        ports::{database::Error as DatabaseError, user::User},
    };
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    type TestLogic = DomainLogic<MemoryDatabase, MemoryUserDirectory, ThreadRandom>;

    /// Domain logic with a user holding 100 points
    #[fixture]
    async fn funded() -> (TestLogic, MemoryDatabase, User) {
        let directory = MemoryUserDirectory::default();
        let user = User::new("Bob");
        directory.insert(user.clone()).unwrap();

        let catalog = Catalog::load(default_rewards()).unwrap();
        let database = MemoryDatabase::default();
        let ledger = Ledger::default();
        let credit = ledger
            .record_transaction(user.user_id, 100, TransactionKind::DrawCredit, "Seed")
            .unwrap();
        let account = ledger
            .credit(&UserPointAccount::new(user.user_id), credit.amount)
            .unwrap();
        database.create_user_account(account).await.unwrap();
        database.save_transaction(credit).await.unwrap();

        let logic = DomainLogic::new(
            Arc::new(database.clone()),
            Arc::new(directory),
            Arc::new(ThreadRandom),
            Arc::new(catalog),
            ledger,
        );
        (logic, database, user)
    }

    #[rstest]
    #[tokio::test]
    async fn test_call(
        #[future] funded: (TestLogic, MemoryDatabase, User),
    ) -> Result<(), BoxError> {
        let (logic, database, user) = funded.await;

        let res = logic
            .oneshot(SpendPointsRequest {
                user_id: user.user_id,
                amount: 40,
                description: Some("Sticker pack".to_string()),
            })
            .await?;

        assert_that!(res.new_balance).is_equal_to(60);
        assert_that!(res.transaction.kind).is_equal_to(TransactionKind::Spend);
        assert_that!(res.transaction.description.as_str()).is_equal_to("Sticker pack");
        let transactions = database.find_transactions_by_user(user.user_id, 10).await?;
        assert_that!(transactions[0]).is_equal_to(res.transaction);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_call_insufficient_balance(
        #[future] funded: (TestLogic, MemoryDatabase, User),
    ) -> Result<(), BoxError> {
        let (logic, database, user) = funded.await;

        let res = logic
            .oneshot(SpendPointsRequest {
                user_id: user.user_id,
                amount: 101,
                description: None,
            })
            .await;

        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::Database(DatabaseError::Ledger(LedgerError::InsufficientBalance {
                    balance: 100,
                    amount: 101,
                }))
            )
        });
        assert_that!(database.get_user_account(user.user_id).await?.balance).is_equal_to(100);
        assert_that!(database.find_transactions_by_user(user.user_id, 10).await?).has_length(1);

        Ok(())
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[tokio::test]
    async fn test_call_invalid_amount(
        #[future] funded: (TestLogic, MemoryDatabase, User),
        #[case] amount: i64,
    ) {
        let (logic, _, user) = funded.await;

        let res = logic
            .oneshot(SpendPointsRequest {
                user_id: user.user_id,
                amount,
                description: None,
            })
            .await;

        assert_that!(res).is_err().matches(|err| {
            matches!(err, Error::Domain(LedgerError::AmountOutOfRange { .. }))
                && err.is_validation()
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_call_unknown_user(#[future] funded: (TestLogic, MemoryDatabase, User)) {
        let (logic, _, _) = funded.await;

        let res = logic
            .oneshot(SpendPointsRequest {
                user_id: Uuid::new_v4(),
                amount: 1,
                description: None,
            })
            .await;

        assert_that!(res).is_err().matches(|err| err.is_user_not_found());
    }
}
