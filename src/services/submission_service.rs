use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use validator::Validate;

use crate::database::client::Db;
use crate::database::surrdb_utils::{
    check_transaction_custom_error, with_conflict_retry, THROW_TASK_COMPLETED,
};
use crate::entities::review_submission::{submission_id, ReviewSubmissionCreate};
use crate::entities::review_task::{AvailableTaskView, ReviewTaskStatus};
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use crate::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use crate::interfaces::repositories::review_task_ifce::{
    ReviewTaskRepositoryInterface, TaskFilter,
};
use crate::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};
use crate::services::consensus_service::ConsensusService;
use crate::utils::validate_utils::{trim_string, validate_not_blank};

pub const AVAILABLE_TASKS_LIMIT: u16 = 20;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SubmissionInput {
    #[validate(range(min = 1, max = 10))]
    pub quality_score: u8,
    #[validate(range(min = 1, max = 10))]
    pub timeliness_score: u8,
    #[validate(range(min = 1, max = 10))]
    pub schema_compliance_score: u8,
    #[validate(range(min = 1, max = 10))]
    pub overall_rating: u8,
    #[serde(deserialize_with = "trim_string")]
    #[validate(custom(function = validate_not_blank))]
    pub findings: String,
    pub evidence: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub submission_id: Thing,
    pub task_id: Thing,
    pub package_name: String,
    pub submitted: u32,
    pub remaining: u32,
    pub consensus_reached: bool,
}

pub struct SubmissionService<'a, T, S, B, P, R>
where
    T: ReviewTaskRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
    P: DataPackageRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    db: &'a Db,
    tasks: &'a T,
    submissions: &'a S,
    packages: &'a P,
    reviewers: &'a R,
    consensus: ConsensusService<'a, T, S, B, P, R>,
}

impl<'a, T, S, B, P, R> SubmissionService<'a, T, S, B, P, R>
where
    T: ReviewTaskRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
    P: DataPackageRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    pub fn new(
        db: &'a Db,
        tasks: &'a T,
        submissions: &'a S,
        balances: &'a B,
        packages: &'a P,
        reviewers: &'a R,
    ) -> Self {
        Self {
            db,
            tasks,
            submissions,
            packages,
            reviewers,
            consensus: ConsensusService::new(db, tasks, submissions, balances, packages, reviewers),
        }
    }

    pub async fn available_tasks(
        &self,
        reviewer: &Thing,
        task_type: Option<String>,
        category: Option<String>,
    ) -> AppResult<Vec<AvailableTaskView>> {
        let filter = TaskFilter {
            task_type: task_type.filter(|v| !v.trim().is_empty()),
            category: category.filter(|v| !v.trim().is_empty()),
            limit: AVAILABLE_TASKS_LIMIT,
        };
        self.tasks.list_available(reviewer, &filter).await
    }

    pub async fn submit(
        &self,
        reviewer: &Thing,
        task_id: &Thing,
        input: SubmissionInput,
    ) -> AppResult<SubmissionAck> {
        input.validate()?;

        self.reviewers
            .get(reviewer)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: reviewer.to_raw(),
            })?;
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: task_id.to_raw(),
            })?;
        if task.status != ReviewTaskStatus::Open || task.is_expired(Utc::now()) {
            return Err(AppError::Unavailable {
                description: "Task is closed or expired".to_string(),
            });
        }
        let sub_id = submission_id(&task.id, reviewer);
        if self.submissions.get(&sub_id).await?.is_some() {
            return Err(AppError::Conflict {
                description: "Task already reviewed by this reviewer".to_string(),
            });
        }
        if task.remaining() == 0 {
            return Err(AppError::Unavailable {
                description: "No assessment slots remaining".to_string(),
            });
        }
        let package = self
            .packages
            .get(&task.package)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: task.package.to_raw(),
            })?;

        let data = ReviewSubmissionCreate {
            task: task.id.clone(),
            reviewer: reviewer.clone(),
            quality_score: input.quality_score,
            timeliness_score: input.timeliness_score,
            schema_compliance_score: input.schema_compliance_score,
            overall_rating: input.overall_rating,
            findings: input.findings,
            evidence: input.evidence,
        };

        let data_ref = &data;
        let submitted = with_conflict_retry(|| async move {
            let mut query = self.db.query("BEGIN TRANSACTION");
            query = self.tasks.build_claim_slot_query(query, &data_ref.task);
            query = self.submissions.build_create_query(query, data_ref);
            query = query
                .query("COMMIT TRANSACTION")
                .query("RETURN $slot[0].submission_count;");
            let mut res = query.await?;
            check_transaction_custom_error(&mut res)?;
            let count: Option<u32> = res.take(res.num_statements() - 1)?;
            Ok(count.unwrap_or_default())
        })
        .await
        .map_err(|err| match err {
            AppError::Conflict { description } if description != THROW_TASK_COMPLETED => {
                AppError::Conflict {
                    description: "Task already reviewed by this reviewer".to_string(),
                }
            }
            err => err,
        })?;

        tracing::info!(task = %task.id, reviewer = %reviewer, submitted, "submission accepted");

        let consensus_reached = if submitted >= task.required_reviews {
            match self.consensus.run(&task.id).await {
                Ok(_) => true,
                Err(AppError::Conflict { .. }) => false,
                Err(err) => {
                    tracing::error!(task = %task.id, "consensus failed after submission: {err:?}");
                    false
                }
            }
        } else {
            false
        };

        Ok(SubmissionAck {
            submission_id: sub_id,
            task_id: task.id.clone(),
            package_name: package.name,
            submitted,
            remaining: task.required_reviews.saturating_sub(submitted),
            consensus_reached,
        })
    }
}
