use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::{Datetime, Id, Thing};

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::surrdb_utils::{
    THROW_SUBMISSIONS_CHANGED, THROW_TASK_COMPLETED, THROW_TASK_UNAVAILABLE,
};
use crate::database::table_names::{
    DATA_PACKAGE_TABLE_NAME, PACKAGE_QUALITY_TABLE_NAME, REVIEW_SUBMISSION_TABLE_NAME,
};
use crate::entities::review_task::{
    AvailableTaskView, ReviewTaskCreate, ReviewTaskEntity, ReviewTaskStatus,
};
use crate::interfaces::repositories::review_task_ifce::{
    ReviewTaskRepositoryInterface, TaskFilter,
};
use crate::middleware::error::{AppError, AppResult};

#[async_trait]
impl ReviewTaskRepositoryInterface for Repository<ReviewTaskEntity> {
    async fn create(&self, data: ReviewTaskCreate) -> AppResult<ReviewTaskEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let mut res = self
            .client
            .query(
                "CREATE $id SET
                    package=$package,
                    task_type=$task_type,
                    required_reviews=$required_reviews,
                    submission_count=0,
                    reward_pool=$reward_pool,
                    status=$status,
                    stats_synced=false,
                    reference_query=$reference_query,
                    expires_at=$expires_at;",
            )
            .bind(("id", id.clone()))
            .bind(("package", data.package))
            .bind(("task_type", data.task_type))
            .bind(("required_reviews", data.required_reviews))
            .bind(("reward_pool", data.reward_pool))
            .bind(("status", ReviewTaskStatus::Open))
            .bind(("reference_query", data.reference_query))
            .bind(("expires_at", Datetime::from(data.expires_at)))
            .await?;
        let created = res.take::<Option<ReviewTaskEntity>>(0)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewTaskEntity>> {
        self.item_by_id(id).await
    }

    async fn list_available(
        &self,
        reviewer: &Thing,
        filter: &TaskFilter,
    ) -> AppResult<Vec<AvailableTaskView>> {
        let task_type_q = filter
            .task_type
            .as_ref()
            .map_or("", |_| "AND task_type = $task_type");
        let category_q = filter
            .category
            .as_ref()
            .map_or("", |_| "AND package.category = $category");

        let qry = format!(
            "LET $reviewed = SELECT VALUE task FROM {REVIEW_SUBMISSION_TABLE_NAME} WHERE reviewer = $reviewer;
            SELECT
                id,
                package AS package_id,
                package.name AS package_name,
                package.supplier.name AS supplier_name,
                package.category AS category,
                task_type,
                reward_pool,
                required_reviews,
                submission_count,
                (type::thing('{PACKAGE_QUALITY_TABLE_NAME}', record::id(package))).overall_rating AS current_rating,
                reference_query,
                created_at,
                expires_at
            FROM {}
            WHERE status = $open
                AND expires_at > time::now()
                AND submission_count < required_reviews
                AND id NOTINSIDE $reviewed
                {task_type_q} {category_q}
            ORDER BY reward_pool DESC, created_at ASC
            LIMIT $limit;",
            self.table_name
        );

        let mut res = self
            .client
            .query(qry)
            .bind(("reviewer", reviewer.clone()))
            .bind(("open", ReviewTaskStatus::Open))
            .bind(("task_type", filter.task_type.clone()))
            .bind(("category", filter.category.clone()))
            .bind(("limit", filter.limit.max(1)))
            .await?;
        Ok(res.take::<Vec<AvailableTaskView>>(1)?)
    }

    async fn list_ready_for_consensus(&self) -> AppResult<Vec<ReviewTaskEntity>> {
        let qry = format!(
            "SELECT * FROM {} WHERE status = $open AND submission_count >= required_reviews;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("open", ReviewTaskStatus::Open))
            .await?;
        Ok(res.take::<Vec<ReviewTaskEntity>>(0)?)
    }

    async fn list_unsynced(&self) -> AppResult<Vec<ReviewTaskEntity>> {
        let qry = format!(
            "SELECT * FROM {} WHERE status = $completed AND stats_synced = false;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("completed", ReviewTaskStatus::Completed))
            .await?;
        Ok(res.take::<Vec<ReviewTaskEntity>>(0)?)
    }

    async fn mark_stats_synced(&self, id: &Thing) -> AppResult<()> {
        self.client
            .query("UPDATE $id SET stats_synced = true;")
            .bind(("id", id.clone()))
            .await?
            .check()?;
        Ok(())
    }

    fn build_claim_slot_query<'b>(&self, query: Query<'b, Any>, task: &Thing) -> Query<'b, Any> {
        query
            .query(format!(
                "LET $slot = UPDATE $slot_task SET submission_count += 1
                    WHERE status = $slot_open AND expires_at > time::now() AND submission_count < required_reviews
                    RETURN AFTER;
                IF array::len($slot) == 0 {{ THROW \"{THROW_TASK_UNAVAILABLE}\" }};"
            ))
            .bind(("slot_task", task.clone()))
            .bind(("slot_open", ReviewTaskStatus::Open))
    }

    fn build_complete_query<'b>(
        &self,
        query: Query<'b, Any>,
        task: &Thing,
        settled_submissions: u32,
    ) -> Query<'b, Any> {
        query
            .query(format!(
                "LET $won = UPDATE $complete_task SET status = $status_completed, completed_at = time::now()
                    WHERE status = $status_open RETURN AFTER;
                IF array::len($won) == 0 {{ THROW \"{THROW_TASK_COMPLETED}\" }};
                IF $won[0].submission_count != $complete_count {{ THROW \"{THROW_SUBMISSIONS_CHANGED}\" }};"
            ))
            .bind(("complete_task", task.clone()))
            .bind(("complete_count", settled_submissions))
            .bind(("status_open", ReviewTaskStatus::Open))
            .bind(("status_completed", ReviewTaskStatus::Completed))
    }
}

impl Repository<ReviewTaskEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS package ON TABLE {table_name} TYPE record<{DATA_PACKAGE_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS task_type ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS required_reviews ON TABLE {table_name} TYPE int ASSERT $value >= 2;
    DEFINE FIELD IF NOT EXISTS submission_count ON TABLE {table_name} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS reward_pool ON TABLE {table_name} TYPE int ASSERT $value >= 0;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS stats_synced ON TABLE {table_name} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS reference_query ON TABLE {table_name} FLEXIBLE TYPE option<object>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS expires_at ON TABLE {table_name} TYPE datetime;
    DEFINE FIELD IF NOT EXISTS completed_at ON TABLE {table_name} TYPE option<datetime>;
    DEFINE INDEX IF NOT EXISTS status_idx ON TABLE {table_name} COLUMNS status;
    DEFINE INDEX IF NOT EXISTS package_idx ON TABLE {table_name} COLUMNS package;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
