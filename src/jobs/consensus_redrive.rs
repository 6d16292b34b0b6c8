use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{middleware::mw_ctx::CtxState, services::consensus_service::ConsensusService};

pub async fn run(state: Arc<CtxState>, interval: Duration) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let service = ConsensusService::new(
                &state.db.client,
                &state.db.review_tasks,
                &state.db.review_submissions,
                &state.db.balances,
                &state.db.data_packages,
                &state.db.reviewers,
            );
            match service.redrive_pending().await {
                Ok(report) if report.settled + report.resynced + report.failed > 0 => {
                    tracing::info!(
                        settled = report.settled,
                        resynced = report.resynced,
                        failed = report.failed,
                        "consensus re-drive pass"
                    );
                }
                Ok(_) => {}
                Err(err) => tracing::error!("consensus re-drive failed: {err:?}"),
            }
        }
    })
}
