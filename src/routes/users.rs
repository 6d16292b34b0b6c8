use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    entities::{amount::Amount, balance::BalanceView, payout::PayoutRecordEntity},
    interfaces::repositories::payout_ifce::PayoutRepositoryInterface,
    middleware::{
        bearer_auth::BearerAuth,
        error::CtxResult,
        mw_ctx::CtxState,
        utils::{db_utils::Pagination, extractor_utils::JsonValidated},
    },
    services::ledger_service::LedgerService,
    utils::validate_utils::deserialize_amount,
};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/users/me/payout_threshold", post(set_payout_threshold))
        .route("/api/users/me/payout_history", get(get_payout_history))
}

#[derive(Debug, Deserialize, Validate)]
struct PayoutThresholdInput {
    #[serde(deserialize_with = "deserialize_amount")]
    threshold: Amount,
}

async fn set_payout_threshold(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    JsonValidated(data): JsonValidated<PayoutThresholdInput>,
) -> CtxResult<Json<BalanceView>> {
    let key = auth_data.caller.account_key()?;
    let balance = LedgerService::new(&state.db.balances)
        .set_threshold(&key, data.threshold)
        .await?;
    Ok(Json(balance))
}

async fn get_payout_history(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Query(pagination): Query<Pagination>,
) -> CtxResult<Json<Vec<PayoutRecordEntity>>> {
    let key = auth_data.caller.account_key()?;
    let records = state
        .db
        .payouts
        .list_records(Some(&key), &pagination)
        .await?;
    Ok(Json(records))
}
