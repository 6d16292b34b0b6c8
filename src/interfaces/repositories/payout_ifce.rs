use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::balance::AccountKey;
use crate::entities::payout::{
    PayoutAttemptEntity, PayoutRecordEntity, SettlementRunCreate, SettlementRunEntity,
};
use crate::middleware::error::AppResult;
use crate::middleware::utils::db_utils::Pagination;

#[async_trait]
pub trait PayoutRepositoryInterface {
    async fn create_attempt(
        &self,
        key: &AccountKey,
        amount: Amount,
        destination: &str,
    ) -> AppResult<PayoutAttemptEntity>;
    async fn list_pending_attempts(&self, key: &AccountKey) -> AppResult<Vec<PayoutAttemptEntity>>;
    async fn list_pending_accounts(&self) -> AppResult<Vec<AccountKey>>;
    async fn mark_attempt_failed(&self, attempt: &Thing, reason: &str) -> AppResult<()>;
    async fn list_records(
        &self,
        key: Option<&AccountKey>,
        pagination: &Pagination,
    ) -> AppResult<Vec<PayoutRecordEntity>>;

    /// Appends the payout record and marks the attempt completed, sets `$record`.
    fn build_finalize_query<'b>(
        &self,
        query: Query<'b, Any>,
        attempt: &PayoutAttemptEntity,
        tx_ref: &str,
    ) -> Query<'b, Any>;
}

#[async_trait]
pub trait SettlementRunRepositoryInterface {
    async fn save(&self, run: &SettlementRunCreate) -> AppResult<SettlementRunEntity>;
    async fn list_recent(&self, limit: u16) -> AppResult<Vec<SettlementRunEntity>>;
}
