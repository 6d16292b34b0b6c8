use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::supplier::{SupplierCreate, SupplierEntity, SupplierStatus};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait SupplierRepositoryInterface {
    /// Also opens the supplier's ledger account.
    async fn create(&self, data: SupplierCreate, payout_threshold: Amount)
        -> AppResult<SupplierEntity>;
    async fn get(&self, id: &Thing) -> AppResult<Option<SupplierEntity>>;
    async fn set_status(&self, id: &Thing, status: SupplierStatus) -> AppResult<SupplierEntity>;
}
