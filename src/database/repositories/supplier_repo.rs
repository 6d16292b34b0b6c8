use async_trait::async_trait;
use surrealdb::sql::{Id, Thing};

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::surrdb_utils::check_transaction_custom_error;
use crate::entities::amount::Amount;
use crate::entities::balance::AccountKey;
use crate::entities::supplier::{SupplierCreate, SupplierEntity, SupplierStatus};
use crate::interfaces::repositories::supplier_ifce::SupplierRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

#[async_trait]
impl SupplierRepositoryInterface for Repository<SupplierEntity> {
    async fn create(
        &self,
        data: SupplierCreate,
        payout_threshold: Amount,
    ) -> AppResult<SupplierEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let account = AccountKey::supplier(id.id.to_raw());
        let qry = "
        BEGIN TRANSACTION;
            LET $supplier = CREATE $id SET
                name=$name,
                email=$email,
                payout_address=$payout_address,
                status=$status
                RETURN AFTER;
            CREATE $account_id SET kind=$account_kind, account_id=$account_key, balance=0,
                payout_threshold=$threshold;
        COMMIT TRANSACTION;
        RETURN $supplier[0];";

        let mut res = self
            .client
            .query(qry)
            .bind(("id", id.clone()))
            .bind(("name", data.name))
            .bind(("email", data.email))
            .bind(("payout_address", data.payout_address))
            .bind(("status", SupplierStatus::Active))
            .bind(("account_id", account.record_id()))
            .bind(("account_kind", account.kind))
            .bind(("account_key", account.id.clone()))
            .bind(("threshold", payout_threshold))
            .await?;
        check_transaction_custom_error(&mut res)?;
        let created: Option<SupplierEntity> = res.take(res.num_statements() - 1)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn get(&self, id: &Thing) -> AppResult<Option<SupplierEntity>> {
        self.item_by_id(id).await
    }

    async fn set_status(&self, id: &Thing, status: SupplierStatus) -> AppResult<SupplierEntity> {
        let mut res = self
            .client
            .query("UPDATE $id SET status=$status RETURN AFTER;")
            .bind(("id", id.clone()))
            .bind(("status", status))
            .await?;
        let updated: Vec<SupplierEntity> = res.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or(AppError::EntityFailIdNotFound {
                ident: id.to_raw(),
            })
    }
}

impl Repository<SupplierEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS name ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS payout_address ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {table_name} TYPE string ASSERT $value INSIDE ['active', 'inactive'];
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
