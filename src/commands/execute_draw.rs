use std::task::{Context, Poll};

use crate::{
    domain::{DrawResult, PointTransaction, RandomSource, TransactionKind},
    ports::{database::DatabasePort, user::UserPort},
};
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use super::{BoxFuture, DomainLogic, Error};

pub struct ExecuteDrawRequest {
    pub user_id: Uuid,
}

#[derive(Debug, PartialEq)]
pub struct ExecuteDrawResponse {
    pub result: DrawResult,
    /// Credit recorded for the drawn reward
    pub transaction: PointTransaction,
    /// Balance right after the credit
    pub new_balance: i64,
}

impl<D, U, R> Service<ExecuteDrawRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: RandomSource + Send + Sync + 'static,
{
    type Response = ExecuteDrawResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ExecuteDrawRequest) -> Self::Future {
        let logic = self.clone();
        let span = tracing::info_span!("execute_draw", user_id = %req.user_id);
        Box::pin(
            async move {
                let user = logic.users.find_user(req.user_id).await?;

                // Pick the reward and build both records before touching the store
                let reward = logic.catalog.draw(&*logic.random)?;
                let result = DrawResult::new(user.user_id, reward);
                let transaction = logic.ledger.record_transaction(
                    user.user_id,
                    reward.point_value,
                    TransactionKind::DrawCredit,
                    format!("Draw reward: {}", reward.name),
                )?;

                let account = logic
                    .database
                    .record_draw(result.clone(), transaction.clone(), logic.ledger)
                    .await
                    .map_err(|err| {
                        tracing::warn!(draw_id = %result.id, error = %err, "draw not recorded");
                        err
                    })?;

                tracing::info!(
                    draw_id = %result.id,
                    reward = %result.reward_name,
                    tier = %result.rarity_tier,
                    points = result.points_earned,
                    balance = account.balance,
                    "draw completed"
                );

                Ok(ExecuteDrawResponse {
                    result,
                    transaction,
                    new_balance: account.balance,
                })
            }
            .instrument(span),
        )
    }
}
