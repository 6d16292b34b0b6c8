use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;

use crate::entities::amount::Amount;
use crate::entities::balance::{AccountKey, BalanceEntity};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait BalanceRepositoryInterface {
    /// Creates the account if missing, existing balances are never touched.
    async fn open_account(&self, key: &AccountKey, threshold: Amount) -> AppResult<BalanceEntity>;
    async fn get(&self, key: &AccountKey) -> AppResult<Option<BalanceEntity>>;
    /// Atomic increment, returns the new balance.
    async fn credit(&self, key: &AccountKey, amount: Amount) -> AppResult<Amount>;
    async fn set_threshold(&self, key: &AccountKey, threshold: Amount) -> AppResult<BalanceEntity>;
    /// Removes a settled amount. Credits that landed after the payout was
    /// requested stay on the account.
    async fn zero_if_unclaimed(&self, key: &AccountKey, settled: Amount) -> AppResult<Amount>;
    async fn try_lock_for_settlement(
        &self,
        key: &AccountKey,
        lock_secs: u64,
    ) -> AppResult<Option<BalanceEntity>>;
    async fn release_settlement_lock(&self, key: &AccountKey) -> AppResult<()>;
    async fn list_payout_eligible(&self) -> AppResult<Vec<AccountKey>>;

    fn build_credit_query<'b>(
        &self,
        query: Query<'b, Any>,
        index: usize,
        key: &AccountKey,
        amount: Amount,
    ) -> Query<'b, Any>;
    fn build_settle_debit_query<'b>(
        &self,
        query: Query<'b, Any>,
        key: &AccountKey,
        settled: Amount,
    ) -> Query<'b, Any>;
}
