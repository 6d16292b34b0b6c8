use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::{Datetime, Id, Thing};

use crate::database::repositories::balance_repo::AccountRow;
use crate::database::repository_impl::Repository;
use crate::database::surrdb_utils::THROW_ATTEMPT_NOT_PENDING;
use crate::database::table_names::{BALANCE_TABLE_NAME, PAYOUT_RECORD_TABLE_NAME};
use crate::entities::amount::Amount;
use crate::entities::balance::AccountKey;
use crate::entities::payout::{
    PayoutAttemptEntity, PayoutAttemptStatus, PayoutRecordEntity, SettlementRunCreate,
    SettlementRunEntity, SettlementStatus,
};
use crate::interfaces::repositories::payout_ifce::{
    PayoutRepositoryInterface, SettlementRunRepositoryInterface,
};
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::utils::db_utils::Pagination;

#[async_trait]
impl PayoutRepositoryInterface for Repository<PayoutAttemptEntity> {
    async fn create_attempt(
        &self,
        key: &AccountKey,
        amount: Amount,
        destination: &str,
    ) -> AppResult<PayoutAttemptEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let mut res = self
            .client
            .query(
                "CREATE $id SET account=$account, kind=$kind, account_id=$account_id,
                    amount=$amount, destination=$destination, status=$status;",
            )
            .bind(("id", id.clone()))
            .bind(("account", key.record_id()))
            .bind(("kind", key.kind))
            .bind(("account_id", key.id.clone()))
            .bind(("amount", amount))
            .bind(("destination", destination.to_string()))
            .bind(("status", PayoutAttemptStatus::Pending))
            .await?;
        let created = res.take::<Option<PayoutAttemptEntity>>(0)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn list_pending_attempts(&self, key: &AccountKey) -> AppResult<Vec<PayoutAttemptEntity>> {
        let qry = format!(
            "SELECT * FROM {} WHERE account = $account AND status = $pending ORDER BY created_at ASC;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("account", key.record_id()))
            .bind(("pending", PayoutAttemptStatus::Pending))
            .await?;
        Ok(res.take::<Vec<PayoutAttemptEntity>>(0)?)
    }

    async fn list_pending_accounts(&self) -> AppResult<Vec<AccountKey>> {
        let qry = format!(
            "SELECT kind, account_id FROM {} WHERE status = $pending GROUP BY kind, account_id;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("pending", PayoutAttemptStatus::Pending))
            .await?;
        let rows = res.take::<Vec<AccountRow>>(0)?;
        Ok(rows.into_iter().map(AccountRow::into_key).collect())
    }

    async fn mark_attempt_failed(&self, attempt: &Thing, reason: &str) -> AppResult<()> {
        self.client
            .query("UPDATE $id SET status=$failed, failure_reason=$reason WHERE status=$pending;")
            .bind(("id", attempt.clone()))
            .bind(("failed", PayoutAttemptStatus::Failed))
            .bind(("pending", PayoutAttemptStatus::Pending))
            .bind(("reason", reason.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    async fn list_records(
        &self,
        key: Option<&AccountKey>,
        pagination: &Pagination,
    ) -> AppResult<Vec<PayoutRecordEntity>> {
        let filter = key.map_or("", |_| "WHERE kind = $kind AND account_id = $account_id");
        let qry = format!(
            "SELECT * FROM {PAYOUT_RECORD_TABLE_NAME} {filter}
            ORDER BY created_at DESC LIMIT $limit START $start;"
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("kind", key.map(|k| k.kind)))
            .bind(("account_id", key.map(|k| k.id.clone())))
            .bind(("limit", pagination.limit()))
            .bind(("start", pagination.start))
            .await?;
        Ok(res.take::<Vec<PayoutRecordEntity>>(0)?)
    }

    fn build_finalize_query<'b>(
        &self,
        query: Query<'b, Any>,
        attempt: &PayoutAttemptEntity,
        tx_ref: &str,
    ) -> Query<'b, Any> {
        let record_id = Thing::from((PAYOUT_RECORD_TABLE_NAME, Id::ulid()));
        query
            .query(format!(
                "LET $attempt_done = UPDATE $fin_attempt SET status = $fin_completed, tx_ref = $fin_tx_ref
                    WHERE status = $fin_pending RETURN AFTER;
                IF array::len($attempt_done) == 0 {{ THROW \"{THROW_ATTEMPT_NOT_PENDING}\" }};
                LET $record = CREATE $fin_record SET
                    tx_ref=$fin_tx_ref,
                    destination=$fin_destination,
                    amount=$fin_amount,
                    kind=$fin_kind,
                    account_id=$fin_account_id,
                    attempt=$fin_attempt
                    RETURN AFTER;"
            ))
            .bind(("fin_attempt", attempt.id.clone()))
            .bind(("fin_completed", PayoutAttemptStatus::Completed))
            .bind(("fin_pending", PayoutAttemptStatus::Pending))
            .bind(("fin_tx_ref", tx_ref.to_string()))
            .bind(("fin_record", record_id))
            .bind(("fin_destination", attempt.destination.clone()))
            .bind(("fin_amount", attempt.amount))
            .bind(("fin_kind", attempt.kind))
            .bind(("fin_account_id", attempt.account_id.clone()))
    }
}

impl Repository<PayoutAttemptEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let record_table = PAYOUT_RECORD_TABLE_NAME;
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS account ON TABLE {table_name} TYPE record<{BALANCE_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS kind ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS account_id ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS amount ON TABLE {table_name} TYPE int ASSERT $value > 0;
    DEFINE FIELD IF NOT EXISTS destination ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS tx_ref ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS failure_reason ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS updated_at ON TABLE {table_name} TYPE option<datetime> DEFAULT time::now() VALUE time::now();
    DEFINE INDEX IF NOT EXISTS status_idx ON TABLE {table_name} COLUMNS status;
    DEFINE INDEX IF NOT EXISTS account_idx ON TABLE {table_name} COLUMNS account;

    DEFINE TABLE IF NOT EXISTS {record_table} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS tx_ref ON TABLE {record_table} TYPE string;
    DEFINE FIELD IF NOT EXISTS destination ON TABLE {record_table} TYPE string;
    DEFINE FIELD IF NOT EXISTS amount ON TABLE {record_table} TYPE int;
    DEFINE FIELD IF NOT EXISTS kind ON TABLE {record_table} TYPE string;
    DEFINE FIELD IF NOT EXISTS account_id ON TABLE {record_table} TYPE string;
    DEFINE FIELD IF NOT EXISTS attempt ON TABLE {record_table} TYPE record<{table_name}>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {record_table} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS attempt_idx ON TABLE {record_table} COLUMNS attempt UNIQUE;
    DEFINE INDEX IF NOT EXISTS account_idx ON TABLE {record_table} COLUMNS kind, account_id;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl SettlementRunRepositoryInterface for Repository<SettlementRunEntity> {
    async fn save(&self, run: &SettlementRunCreate) -> AppResult<SettlementRunEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let mut res = self
            .client
            .query(
                "CREATE $id SET
                    started_at=$started_at,
                    finished_at=$finished_at,
                    paid=$paid,
                    skipped=$skipped,
                    failed=$failed,
                    total_paid=$total_paid,
                    outcomes=$outcomes;",
            )
            .bind(("id", id.clone()))
            .bind(("started_at", Datetime::from(run.started_at)))
            .bind(("finished_at", Datetime::from(run.finished_at)))
            .bind(("paid", run.count(SettlementStatus::Paid)))
            .bind(("skipped", run.count(SettlementStatus::Skipped)))
            .bind(("failed", run.count(SettlementStatus::Failed)))
            .bind(("total_paid", run.total_paid()))
            .bind(("outcomes", run.outcomes.clone()))
            .await?;
        let created = res.take::<Option<SettlementRunEntity>>(0)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn list_recent(&self, limit: u16) -> AppResult<Vec<SettlementRunEntity>> {
        let qry = format!(
            "SELECT * FROM {} ORDER BY started_at DESC LIMIT $limit;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("limit", limit.max(1)))
            .await?;
        Ok(res.take::<Vec<SettlementRunEntity>>(0)?)
    }
}

impl Repository<SettlementRunEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMALESS;
    DEFINE FIELD IF NOT EXISTS started_at ON TABLE {table_name} TYPE datetime;
    DEFINE FIELD IF NOT EXISTS finished_at ON TABLE {table_name} TYPE datetime;
    DEFINE FIELD IF NOT EXISTS total_paid ON TABLE {table_name} TYPE int;
    DEFINE INDEX IF NOT EXISTS started_idx ON TABLE {table_name} COLUMNS started_at;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
