use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{
    database::table_names::{DATA_PACKAGE_TABLE_NAME, REVIEW_TASK_TABLE_NAME},
    entities::{
        amount::Amount,
        payout::{PayoutRecordEntity, SettlementRunEntity},
        review_task::{ConsensusPlan, ReviewTaskCreate, ReviewTaskEntity},
    },
    interfaces::repositories::{
        data_package_ifce::DataPackageRepositoryInterface,
        payout_ifce::{PayoutRepositoryInterface, SettlementRunRepositoryInterface},
        review_task_ifce::ReviewTaskRepositoryInterface,
    },
    middleware::{
        bearer_auth::BearerAuth,
        error::{AppError, CtxResult},
        mw_ctx::CtxState,
        utils::{
            db_utils::Pagination, extractor_utils::JsonValidated, string_utils::get_str_thing,
        },
    },
    services::{
        consensus_service::ConsensusService,
        revenue_service::{RevenueService, RevenueShares},
        settlement_service::SettlementService,
    },
    utils::{
        jwt::CallerRole,
        validate_utils::{deserialize_option_amount, trim_string, validate_not_blank},
    },
};

const DEFAULT_REWARD_POOL: Amount = Amount::from_micros(50_000);
const DEFAULT_REQUIRED_REVIEWS: u32 = 3;
const DEFAULT_EXPIRES_IN_HOURS: u32 = 72;
const RECENT_RUNS_LIMIT: u16 = 20;

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/payouts", get(get_payouts))
        .route("/api/admin/review_tasks", post(create_review_task))
        .route(
            "/api/admin/review_tasks/:task_id/consensus",
            post(force_consensus),
        )
        .route(
            "/api/admin/settlements",
            post(run_settlement).get(get_settlements),
        )
        .route(
            "/api/admin/packages/:package_id/query_revenue",
            post(record_query_revenue),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewTaskInput {
    pub package_id: String,
    #[serde(deserialize_with = "trim_string")]
    #[validate(custom(function = validate_not_blank))]
    pub task_type: String,
    #[serde(default, deserialize_with = "deserialize_option_amount")]
    pub reward_pool: Option<Amount>,
    #[validate(range(min = 2, max = 100))]
    pub required_reviews: Option<u32>,
    #[validate(range(min = 1, max = 8760))]
    pub expires_in_hours: Option<u32>,
    pub reference_query: Option<serde_json::Value>,
}

async fn get_payouts(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Query(pagination): Query<Pagination>,
) -> CtxResult<Json<Vec<PayoutRecordEntity>>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let records = state.db.payouts.list_records(None, &pagination).await?;
    Ok(Json(records))
}

async fn create_review_task(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    JsonValidated(data): JsonValidated<ReviewTaskInput>,
) -> CtxResult<Json<ReviewTaskEntity>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let package_id = get_str_thing(DATA_PACKAGE_TABLE_NAME, &data.package_id)?;
    let reward_pool = data.reward_pool.unwrap_or(DEFAULT_REWARD_POOL);
    if !reward_pool.is_positive() {
        return Err(auth_data.ctx.to_ctx_error(AppError::Validation {
            description: "reward_pool must be positive".to_string(),
        }));
    }

    let package = state
        .db
        .data_packages
        .get(&package_id)
        .await?
        .ok_or(AppError::EntityFailIdNotFound {
            ident: package_id.to_raw(),
        })?;

    let hours = data.expires_in_hours.unwrap_or(DEFAULT_EXPIRES_IN_HOURS);
    let task = state
        .db
        .review_tasks
        .create(ReviewTaskCreate {
            package: package.id,
            task_type: data.task_type,
            required_reviews: data.required_reviews.unwrap_or(DEFAULT_REQUIRED_REVIEWS),
            reward_pool,
            expires_at: Utc::now() + Duration::hours(hours as i64),
            reference_query: data.reference_query,
        })
        .await?;

    tracing::info!(task = %task.id, package = %task.package, reward_pool = %task.reward_pool, "review task created");
    Ok(Json(task))
}

async fn force_consensus(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Path(task_id): Path<String>,
) -> CtxResult<Json<ConsensusPlan>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let task_id = get_str_thing(REVIEW_TASK_TABLE_NAME, &task_id)?;
    let plan = ConsensusService::new(
        &state.db.client,
        &state.db.review_tasks,
        &state.db.review_submissions,
        &state.db.balances,
        &state.db.data_packages,
        &state.db.reviewers,
    )
    .run(&task_id)
    .await?;
    Ok(Json(plan))
}

async fn run_settlement(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<SettlementRunEntity>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let run = SettlementService::new(
        &state.db.client,
        &state.db.balances,
        &state.db.payouts,
        &state.db.settlement_runs,
        &state.db.reviewers,
        &state.db.suppliers,
        state.payment_rail.as_ref(),
        &state.settlement,
    )
    .run()
    .await?;
    Ok(Json(run))
}

async fn get_settlements(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<Vec<SettlementRunEntity>>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let runs = state.db.settlement_runs.list_recent(RECENT_RUNS_LIMIT).await?;
    Ok(Json(runs))
}

async fn record_query_revenue(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Path(package_id): Path<String>,
) -> CtxResult<Json<RevenueShares>> {
    auth_data.caller.require(CallerRole::Admin)?;
    let package_id = get_str_thing(DATA_PACKAGE_TABLE_NAME, &package_id)?;
    let shares = RevenueService::new(
        &state.db.client,
        &state.db.data_packages,
        &state.db.suppliers,
        &state.db.balances,
        state.revenue_split,
    )
    .record_query(&package_id)
    .await?;
    Ok(Json(shares))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_input_defaults_and_bounds() {
        let input: ReviewTaskInput =
            serde_json::from_str(r#"{"package_id":"p1","task_type":"quality_check"}"#).unwrap();
        assert!(input.validate().is_ok());
        assert!(input.reward_pool.is_none());

        let input: ReviewTaskInput = serde_json::from_str(
            r#"{"package_id":"p1","task_type":"quality_check","required_reviews":1}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());

        let input: ReviewTaskInput = serde_json::from_str(
            r#"{"package_id":"p1","task_type":"  ","reward_pool":"0.30"}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
        assert_eq!(input.reward_pool, Some(Amount::from_micros(300_000)));
    }
}
