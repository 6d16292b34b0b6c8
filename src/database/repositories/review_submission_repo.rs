use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::Thing;

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::table_names::{REVIEWER_TABLE_NAME, REVIEW_TASK_TABLE_NAME};
use crate::entities::review_submission::{
    submission_id, RecentReviewView, ReviewSubmissionCreate, ReviewSubmissionEntity,
    SettledSubmission,
};
use crate::entities::review_task::PlannedPayout;
use crate::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

#[async_trait]
impl ReviewSubmissionRepositoryInterface for Repository<ReviewSubmissionEntity> {
    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewSubmissionEntity>> {
        self.item_by_id(id).await
    }

    async fn list_by_task(&self, task: &Thing) -> AppResult<Vec<ReviewSubmissionEntity>> {
        let qry = format!(
            "SELECT * FROM {} WHERE task = $task ORDER BY submitted_at ASC;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("task", task.clone()))
            .await?;
        Ok(res.take::<Vec<ReviewSubmissionEntity>>(0)?)
    }

    async fn list_settled_by_reviewer(
        &self,
        reviewer: &Thing,
    ) -> AppResult<Vec<SettledSubmission>> {
        let qry = format!(
            "SELECT is_consensus, payout, submitted_at, task.created_at AS task_created_at
            FROM {} WHERE reviewer = $reviewer AND is_consensus != NONE;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("reviewer", reviewer.clone()))
            .await?;
        Ok(res.take::<Vec<SettledSubmission>>(0)?)
    }

    async fn list_recent_for_package(
        &self,
        package: &Thing,
        limit: u16,
    ) -> AppResult<Vec<RecentReviewView>> {
        let qry = format!(
            "SELECT overall_rating AS rating, reviewer.name AS reviewer, findings, submitted_at AS date
            FROM {} WHERE task.package = $package ORDER BY date DESC LIMIT $limit;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("package", package.clone()))
            .bind(("limit", limit))
            .await?;
        Ok(res.take::<Vec<RecentReviewView>>(0)?)
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, Any>,
        data: &ReviewSubmissionCreate,
    ) -> Query<'b, Any> {
        query
            .query(
                "LET $submission = CREATE $sub_id SET
                    task=$sub_task,
                    reviewer=$sub_reviewer,
                    quality_score=$sub_quality,
                    timeliness_score=$sub_timeliness,
                    schema_compliance_score=$sub_schema,
                    overall_rating=$sub_overall,
                    findings=$sub_findings,
                    evidence=$sub_evidence
                    RETURN AFTER;",
            )
            .bind(("sub_id", submission_id(&data.task, &data.reviewer)))
            .bind(("sub_task", data.task.clone()))
            .bind(("sub_reviewer", data.reviewer.clone()))
            .bind(("sub_quality", data.quality_score))
            .bind(("sub_timeliness", data.timeliness_score))
            .bind(("sub_schema", data.schema_compliance_score))
            .bind(("sub_overall", data.overall_rating))
            .bind(("sub_findings", data.findings.clone()))
            .bind(("sub_evidence", data.evidence.clone()))
    }

    fn build_settle_query<'b>(
        &self,
        query: Query<'b, Any>,
        index: usize,
        entry: &PlannedPayout,
    ) -> Query<'b, Any> {
        query
            .query(format!(
                "UPDATE $settle_sub_{index} SET is_consensus = $settle_cons_{index}, payout = $settle_pay_{index};"
            ))
            .bind((format!("settle_sub_{index}"), entry.submission.clone()))
            .bind((format!("settle_cons_{index}"), entry.is_consensus))
            .bind((format!("settle_pay_{index}"), entry.payout))
    }
}

impl Repository<ReviewSubmissionEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS task ON TABLE {table_name} TYPE record<{REVIEW_TASK_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS reviewer ON TABLE {table_name} TYPE record<{REVIEWER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS quality_score ON TABLE {table_name} TYPE int ASSERT $value >= 1 AND $value <= 10;
    DEFINE FIELD IF NOT EXISTS timeliness_score ON TABLE {table_name} TYPE int ASSERT $value >= 1 AND $value <= 10;
    DEFINE FIELD IF NOT EXISTS schema_compliance_score ON TABLE {table_name} TYPE int ASSERT $value >= 1 AND $value <= 10;
    DEFINE FIELD IF NOT EXISTS overall_rating ON TABLE {table_name} TYPE int ASSERT $value >= 1 AND $value <= 10;
    DEFINE FIELD IF NOT EXISTS findings ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS evidence ON TABLE {table_name} FLEXIBLE TYPE option<object>;
    DEFINE FIELD IF NOT EXISTS submitted_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS is_consensus ON TABLE {table_name} TYPE option<bool>;
    DEFINE FIELD IF NOT EXISTS payout ON TABLE {table_name} TYPE option<int>;
    DEFINE INDEX IF NOT EXISTS task_idx ON TABLE {table_name} COLUMNS task;
    DEFINE INDEX IF NOT EXISTS reviewer_idx ON TABLE {table_name} COLUMNS reviewer;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
