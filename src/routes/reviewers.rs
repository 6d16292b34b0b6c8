use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    database::table_names::REVIEWER_TABLE_NAME,
    entities::{
        balance::{AccountKey, BalanceView},
        reviewer::{ReviewerEntity, ReviewerStatsView},
    },
    interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface,
    middleware::{
        bearer_auth::BearerAuth,
        error::{AppError, CtxResult},
        mw_ctx::CtxState,
        utils::string_utils::get_str_thing,
    },
    services::{ledger_service::LedgerService, reputation_service::ReputationService},
};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/reviewers/me", get(get_me))
        .route("/api/reviewers/:reviewer_id/stats", get(get_stats))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewerProfileView {
    pub reviewer: ReviewerEntity,
    pub stats: ReviewerStatsView,
    pub balance: BalanceView,
}

async fn get_me(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<ReviewerProfileView>> {
    let reviewer_id = auth_data.caller.reviewer_thing()?;
    let reviewer = state
        .db
        .reviewers
        .get(&reviewer_id)
        .await?
        .ok_or(AppError::EntityFailIdNotFound {
            ident: reviewer_id.to_raw(),
        })?;
    let stats = ReputationService::new(&state.db.review_submissions, &state.db.reviewers)
        .get_stats(&reviewer.id)
        .await?;
    let balance = LedgerService::new(&state.db.balances)
        .get(&AccountKey::reviewer(reviewer.id.id.to_raw()))
        .await?;

    Ok(Json(ReviewerProfileView {
        reviewer,
        stats,
        balance,
    }))
}

async fn get_stats(
    _auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Path(reviewer_id): Path<String>,
) -> CtxResult<Json<ReviewerStatsView>> {
    let reviewer_id = get_str_thing(REVIEWER_TABLE_NAME, &reviewer_id)?;
    let stats = ReputationService::new(&state.db.review_submissions, &state.db.reviewers)
        .get_stats(&reviewer_id)
        .await?;
    Ok(Json(stats))
}
