use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::reviewer::{
    ReputationLevel, ReviewerCreate, ReviewerEntity, ReviewerStats, ReviewerStatsEntity,
};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ReviewerRepositoryInterface {
    /// Also opens the reviewer's ledger account and an empty stats row.
    async fn create(&self, data: ReviewerCreate, payout_threshold: Amount)
        -> AppResult<ReviewerEntity>;
    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewerEntity>>;
    async fn get_stats(&self, id: &Thing) -> AppResult<Option<ReviewerStatsEntity>>;
    async fn save_stats(
        &self,
        id: &Thing,
        stats: &ReviewerStats,
        level: ReputationLevel,
    ) -> AppResult<ReviewerStatsEntity>;
}
