use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::Thing;

use crate::entities::review_task::{AvailableTaskView, ReviewTaskCreate, ReviewTaskEntity};
use crate::middleware::error::AppResult;

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub task_type: Option<String>,
    pub category: Option<String>,
    pub limit: u16,
}

#[async_trait]
pub trait ReviewTaskRepositoryInterface {
    async fn create(&self, data: ReviewTaskCreate) -> AppResult<ReviewTaskEntity>;
    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewTaskEntity>>;
    async fn list_available(
        &self,
        reviewer: &Thing,
        filter: &TaskFilter,
    ) -> AppResult<Vec<AvailableTaskView>>;
    /// Open tasks whose slots are all taken but were never settled.
    async fn list_ready_for_consensus(&self) -> AppResult<Vec<ReviewTaskEntity>>;
    /// Completed tasks whose reviewers still wait for a reputation pass.
    async fn list_unsynced(&self) -> AppResult<Vec<ReviewTaskEntity>>;
    async fn mark_stats_synced(&self, id: &Thing) -> AppResult<()>;

    /// Sets `$slot` to the updated task or throws when no slot is free.
    fn build_claim_slot_query<'b>(&self, query: Query<'b, Any>, task: &Thing) -> Query<'b, Any>;
    /// Open -> Completed, throws when the task is no longer open or when its
    /// submission count moved away from `settled_submissions`.
    fn build_complete_query<'b>(
        &self,
        query: Query<'b, Any>,
        task: &Thing,
        settled_submissions: u32,
    ) -> Query<'b, Any>;
}
