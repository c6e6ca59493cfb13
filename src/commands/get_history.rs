use std::task::{Context, Poll};

use crate::{
    domain::{DrawResult, PointTransaction},
    ports::{database::DatabasePort, user::UserPort},
};
use tower::Service;
use uuid::Uuid;

use super::{check_limit, BoxFuture, DomainLogic, Error};

/// Most recent draws of a user, newest first
pub struct DrawHistoryRequest {
    pub user_id: Uuid,
    /// Must be positive, see [`super::DEFAULT_HISTORY_LIMIT`]
    pub limit: usize,
}

/// Most recent point transactions of a user, newest first
pub struct TransactionHistoryRequest {
    pub user_id: Uuid,
    pub limit: usize,
}

impl<D, U, R> Service<DrawHistoryRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    type Response = Vec<DrawResult>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DrawHistoryRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            check_limit(req.limit)?;
            let user = logic.users.find_user(req.user_id).await?;

            let results = logic
                .database
                .find_draw_results_by_user(user.user_id, req.limit)
                .await?;
            Ok(results)
        })
    }
}

impl<D, U, R> Service<TransactionHistoryRequest> for DomainLogic<D, U, R>
where
    D: DatabasePort + Send + Sync + 'static,
    U: UserPort + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    type Response = Vec<PointTransaction>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TransactionHistoryRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            check_limit(req.limit)?;
            let user = logic.users.find_user(req.user_id).await?;

            let transactions = logic
                .database
                .find_transactions_by_user(user.user_id, req.limit)
                .await?;
            Ok(transactions)
        })
    }
}
