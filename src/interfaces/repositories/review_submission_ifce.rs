use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::Thing;

use crate::entities::review_submission::{
    RecentReviewView, ReviewSubmissionCreate, ReviewSubmissionEntity, SettledSubmission,
};
use crate::entities::review_task::PlannedPayout;
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ReviewSubmissionRepositoryInterface {
    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewSubmissionEntity>>;
    async fn list_by_task(&self, task: &Thing) -> AppResult<Vec<ReviewSubmissionEntity>>;
    async fn list_settled_by_reviewer(&self, reviewer: &Thing)
        -> AppResult<Vec<SettledSubmission>>;
    async fn list_recent_for_package(
        &self,
        package: &Thing,
        limit: u16,
    ) -> AppResult<Vec<RecentReviewView>>;

    /// Fails with "already exists" when the reviewer already reviewed the task.
    fn build_create_query<'b>(
        &self,
        query: Query<'b, Any>,
        data: &ReviewSubmissionCreate,
    ) -> Query<'b, Any>;
    fn build_settle_query<'b>(
        &self,
        query: Query<'b, Any>,
        index: usize,
        entry: &PlannedPayout,
    ) -> Query<'b, Any>;
}
