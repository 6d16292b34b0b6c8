use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::surrdb_utils::{with_conflict_retry, THROW_ACCOUNT_NOT_FOUND};
use crate::entities::amount::Amount;
use crate::entities::balance::{
    AccountKey, AccountKind, BalanceEntity, TREASURY_PLATFORM, TREASURY_REVIEWER_POOL,
};
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct AccountRow {
    kind: AccountKind,
    account_id: String,
}

impl AccountRow {
    pub(crate) fn into_key(self) -> AccountKey {
        AccountKey::new(self.kind, self.account_id)
    }
}

#[async_trait]
impl BalanceRepositoryInterface for Repository<BalanceEntity> {
    async fn open_account(&self, key: &AccountKey, threshold: Amount) -> AppResult<BalanceEntity> {
        let res = self
            .client
            .query(
                "CREATE $id SET kind=$kind, account_id=$account_id, balance=0, payout_threshold=$threshold;",
            )
            .bind(("id", key.record_id()))
            .bind(("kind", key.kind))
            .bind(("account_id", key.id.clone()))
            .bind(("threshold", threshold))
            .await?
            .take::<Option<BalanceEntity>>(0);

        match res {
            Ok(Some(created)) => Ok(created),
            Ok(None) => Err(AppError::EntityFailIdNotFound {
                ident: key.to_string(),
            }),
            Err(err) if err.to_string().contains("already exists") => {
                self.get(key).await?.ok_or(AppError::EntityFailIdNotFound {
                    ident: key.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, key: &AccountKey) -> AppResult<Option<BalanceEntity>> {
        self.item_by_id(&key.record_id()).await
    }

    async fn credit(&self, key: &AccountKey, amount: Amount) -> AppResult<Amount> {
        with_conflict_retry(|| async move {
            let mut res = self
                .client
                .query("UPDATE $id SET balance += $amount RETURN VALUE balance;")
                .bind(("id", key.record_id()))
                .bind(("amount", amount))
                .await?;
            let updated: Vec<Amount> = res.take(0)?;
            updated
                .into_iter()
                .next()
                .ok_or(AppError::EntityFailIdNotFound {
                    ident: key.to_string(),
                })
        })
        .await
    }

    async fn set_threshold(&self, key: &AccountKey, threshold: Amount) -> AppResult<BalanceEntity> {
        let mut res = self
            .client
            .query("UPDATE $id SET payout_threshold = $threshold RETURN AFTER;")
            .bind(("id", key.record_id()))
            .bind(("threshold", threshold))
            .await?;
        let updated: Vec<BalanceEntity> = res.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or(AppError::EntityFailIdNotFound {
                ident: key.to_string(),
            })
    }

    async fn zero_if_unclaimed(&self, key: &AccountKey, settled: Amount) -> AppResult<Amount> {
        with_conflict_retry(|| async move {
            let mut res = self
                .client
                .query("UPDATE $id SET balance -= $settled RETURN VALUE balance;")
                .bind(("id", key.record_id()))
                .bind(("settled", settled))
                .await?;
            let updated: Vec<Amount> = res.take(0)?;
            updated
                .into_iter()
                .next()
                .ok_or(AppError::EntityFailIdNotFound {
                    ident: key.to_string(),
                })
        })
        .await
    }

    async fn try_lock_for_settlement(
        &self,
        key: &AccountKey,
        lock_secs: u64,
    ) -> AppResult<Option<BalanceEntity>> {
        let qry = "UPDATE $id SET settlement_lock = time::now() + <duration>string::concat($lock_secs, 's')
            WHERE settlement_lock = NONE OR settlement_lock < time::now() RETURN AFTER;";
        with_conflict_retry(|| async move {
            let mut res = self
                .client
                .query(qry)
                .bind(("id", key.record_id()))
                .bind(("lock_secs", lock_secs))
                .await?;
            let locked: Vec<BalanceEntity> = res.take(0)?;
            Ok(locked.into_iter().next())
        })
        .await
    }

    async fn release_settlement_lock(&self, key: &AccountKey) -> AppResult<()> {
        with_conflict_retry(|| async move {
            self.client
                .query("UPDATE $id SET settlement_lock = NONE;")
                .bind(("id", key.record_id()))
                .await?
                .check()?;
            Ok(())
        })
        .await
    }

    async fn list_payout_eligible(&self) -> AppResult<Vec<AccountKey>> {
        let qry = format!(
            "SELECT kind, account_id FROM {} WHERE kind != $treasury AND balance > 0 AND balance >= payout_threshold;",
            self.table_name
        );
        let mut res = self
            .client
            .query(qry)
            .bind(("treasury", AccountKind::TreasuryPool))
            .await?;
        let rows = res.take::<Vec<AccountRow>>(0)?;
        Ok(rows.into_iter().map(AccountRow::into_key).collect())
    }

    fn build_credit_query<'b>(
        &self,
        query: Query<'b, Any>,
        index: usize,
        key: &AccountKey,
        amount: Amount,
    ) -> Query<'b, Any> {
        query
            .query(format!(
                "LET $credited_{index} = UPDATE $credit_acc_{index} SET balance += $credit_amount_{index} RETURN AFTER;
                IF array::len($credited_{index}) == 0 {{ THROW \"{THROW_ACCOUNT_NOT_FOUND}\" }};"
            ))
            .bind((format!("credit_acc_{index}"), key.record_id()))
            .bind((format!("credit_amount_{index}"), amount))
    }

    fn build_settle_debit_query<'b>(
        &self,
        query: Query<'b, Any>,
        key: &AccountKey,
        settled: Amount,
    ) -> Query<'b, Any> {
        query
            .query(format!(
                "LET $debited = UPDATE $settle_acc SET balance -= $settle_amount, settlement_lock = NONE RETURN AFTER;
                IF array::len($debited) == 0 {{ THROW \"{THROW_ACCOUNT_NOT_FOUND}\" }};"
            ))
            .bind(("settle_acc", key.record_id()))
            .bind(("settle_amount", settled))
    }
}

impl Repository<BalanceEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS kind ON TABLE {table_name} TYPE string ASSERT $value INSIDE ['supplier', 'reviewer', 'treasury_pool'];
    DEFINE FIELD IF NOT EXISTS account_id ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS balance ON TABLE {table_name} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS payout_threshold ON TABLE {table_name} TYPE int DEFAULT 0 ASSERT $value >= 0;
    DEFINE FIELD IF NOT EXISTS settlement_lock ON TABLE {table_name} TYPE option<datetime>;
    DEFINE FIELD IF NOT EXISTS r_created ON TABLE {table_name} TYPE option<datetime> DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS r_updated ON TABLE {table_name} TYPE option<datetime> DEFAULT time::now() VALUE time::now();
    DEFINE INDEX IF NOT EXISTS kind_idx ON TABLE {table_name} COLUMNS kind;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;

        for pool in [TREASURY_REVIEWER_POOL, TREASURY_PLATFORM] {
            self.open_account(&AccountKey::treasury(pool), Amount::ZERO)
                .await?;
        }
        Ok(())
    }
}
