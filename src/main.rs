use std::sync::Arc;

use anyhow::Context;
use points_rewards_service::{
    adapters::{database::memory::MemoryDatabase, user::memory::MemoryUserDirectory},
    commands::{
        execute_draw::ExecuteDrawRequest,
        get_balance::{BalanceRequest, ReconcileRequest},
        get_history::DrawHistoryRequest,
        DomainLogic, DEFAULT_HISTORY_LIMIT,
    },
    config::AppConfig,
    domain::{Catalog, Ledger, ThreadRandom},
    ports::user::User,
    telemetry,
};
use tower::ServiceExt;

const DEMO_DRAWS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.log)?;

    // A malformed catalog must stop the service before it serves anything
    let catalog = Catalog::load(config.catalog).context("invalid reward catalog")?;

    config
        .ledger
        .validate(&catalog)
        .context("invalid ledger limits")?;
    let ledger = Ledger::new(config.ledger);
    let users = MemoryUserDirectory::default();
    let user = User::new("demo");
    users.insert(user.clone())?;
    let logic = DomainLogic::new(
        Arc::new(MemoryDatabase::default()),
        Arc::new(users),
        Arc::new(ThreadRandom),
        Arc::new(catalog),
        ledger,
    );
    tracing::info!(items = logic.catalog().items().len(), "catalog loaded");

    for _ in 0..DEMO_DRAWS {
        logic
            .clone()
            .oneshot(ExecuteDrawRequest {
                user_id: user.user_id,
            })
            .await?;
    }

    let balance = logic
        .clone()
        .oneshot(BalanceRequest {
            user_id: user.user_id,
        })
        .await?;
    tracing::info!(user_id = %balance.user_id, balance = balance.balance, "current balance");

    let history = logic
        .clone()
        .oneshot(DrawHistoryRequest {
            user_id: user.user_id,
            limit: DEFAULT_HISTORY_LIMIT,
        })
        .await?;
    for result in history {
        tracing::info!(
            reward = %result.reward_name,
            tier = %result.rarity_tier,
            points = result.points_earned,
            at = %result.created_at,
            "history"
        );
    }

    let report = logic
        .oneshot(ReconcileRequest {
            user_id: user.user_id,
        })
        .await?;
    tracing::info!(
        consistent = report.consistent,
        transactions = report.transaction_count,
        draws = report.draw_count,
        "reconciliation"
    );

    Ok(())
}
