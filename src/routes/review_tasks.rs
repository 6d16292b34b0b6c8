use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    database::table_names::REVIEW_TASK_TABLE_NAME,
    entities::review_task::AvailableTaskView,
    middleware::{
        bearer_auth::BearerAuth,
        error::CtxResult,
        mw_ctx::CtxState,
        utils::{extractor_utils::JsonValidated, string_utils::get_str_thing},
    },
    services::submission_service::{SubmissionAck, SubmissionInput, SubmissionService},
};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/review_tasks", get(get_available_tasks))
        .route(
            "/api/review_tasks/:task_id/submissions",
            post(submit_review),
        )
}

#[derive(Debug, Deserialize)]
struct AvailableTasksQuery {
    task_type: Option<String>,
    category: Option<String>,
}

async fn get_available_tasks(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Query(query): Query<AvailableTasksQuery>,
) -> CtxResult<Json<Vec<AvailableTaskView>>> {
    let reviewer = auth_data.caller.reviewer_thing()?;
    let service = SubmissionService::new(
        &state.db.client,
        &state.db.review_tasks,
        &state.db.review_submissions,
        &state.db.balances,
        &state.db.data_packages,
        &state.db.reviewers,
    );
    let tasks = service
        .available_tasks(&reviewer, query.task_type, query.category)
        .await?;
    Ok(Json(tasks))
}

async fn submit_review(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Path(task_id): Path<String>,
    JsonValidated(data): JsonValidated<SubmissionInput>,
) -> CtxResult<Json<SubmissionAck>> {
    let reviewer = auth_data.caller.reviewer_thing()?;
    let task_id = get_str_thing(REVIEW_TASK_TABLE_NAME, &task_id)?;
    let service = SubmissionService::new(
        &state.db.client,
        &state.db.review_tasks,
        &state.db.review_submissions,
        &state.db.balances,
        &state.db.data_packages,
        &state.db.reviewers,
    );
    let ack = service.submit(&reviewer, &task_id, data).await?;
    Ok(Json(ack))
}
