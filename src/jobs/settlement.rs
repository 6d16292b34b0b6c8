use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{middleware::mw_ctx::CtxState, services::settlement_service::SettlementService};

pub async fn run(state: Arc<CtxState>, interval: Duration) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let service = SettlementService::new(
                &state.db.client,
                &state.db.balances,
                &state.db.payouts,
                &state.db.settlement_runs,
                &state.db.reviewers,
                &state.db.suppliers,
                state.payment_rail.as_ref(),
                &state.settlement,
            );
            if let Err(err) = service.run().await {
                tracing::error!("settlement job failed: {err:?}");
            }
        }
    })
}
