use async_trait::async_trait;
use surrealdb::sql::{Id, Thing};

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::surrdb_utils::check_transaction_custom_error;
use crate::database::table_names::REVIEWER_STATS_TABLE_NAME;
use crate::entities::amount::Amount;
use crate::entities::balance::AccountKey;
use crate::entities::reviewer::{
    ReputationLevel, ReviewerCreate, ReviewerEntity, ReviewerStats, ReviewerStatsEntity,
};
use crate::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

fn stats_id(reviewer: &Thing) -> Thing {
    Thing::from((REVIEWER_STATS_TABLE_NAME, reviewer.id.to_raw().as_str()))
}

#[async_trait]
impl ReviewerRepositoryInterface for Repository<ReviewerEntity> {
    async fn create(
        &self,
        data: ReviewerCreate,
        payout_threshold: Amount,
    ) -> AppResult<ReviewerEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let account = AccountKey::reviewer(id.id.to_raw());
        let qry = "
        BEGIN TRANSACTION;
            LET $reviewer = CREATE $id SET
                name=$name,
                email=$email,
                payout_address=$payout_address,
                specializations=$specializations,
                reputation_level=$level
                RETURN AFTER;
            CREATE $stats_id SET reviewer=$id, total_reviews=0, consensus_rate=0.0,
                accuracy_score=0.0, total_earned=0, avg_review_time_minutes=0.0;
            CREATE $account_id SET kind=$account_kind, account_id=$account_key, balance=0,
                payout_threshold=$threshold;
        COMMIT TRANSACTION;
        RETURN $reviewer[0];";

        let mut res = self
            .client
            .query(qry)
            .bind(("id", id.clone()))
            .bind(("name", data.name))
            .bind(("email", data.email))
            .bind(("payout_address", data.payout_address))
            .bind(("specializations", data.specializations))
            .bind(("level", ReputationLevel::Novice))
            .bind(("stats_id", stats_id(&id)))
            .bind(("account_id", account.record_id()))
            .bind(("account_kind", account.kind))
            .bind(("account_key", account.id.clone()))
            .bind(("threshold", payout_threshold))
            .await?;
        check_transaction_custom_error(&mut res)?;
        let created: Option<ReviewerEntity> = res.take(res.num_statements() - 1)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn get(&self, id: &Thing) -> AppResult<Option<ReviewerEntity>> {
        self.item_by_id(id).await
    }

    async fn get_stats(&self, id: &Thing) -> AppResult<Option<ReviewerStatsEntity>> {
        let mut res = self
            .client
            .query("SELECT * FROM ONLY $id;")
            .bind(("id", stats_id(id)))
            .await?;
        Ok(res.take::<Option<ReviewerStatsEntity>>(0)?)
    }

    async fn save_stats(
        &self,
        id: &Thing,
        stats: &ReviewerStats,
        level: ReputationLevel,
    ) -> AppResult<ReviewerStatsEntity> {
        let qry = "
        BEGIN TRANSACTION;
            LET $stats = UPSERT $stats_id SET
                reviewer=$reviewer,
                total_reviews=$total_reviews,
                consensus_rate=$consensus_rate,
                accuracy_score=$accuracy_score,
                total_earned=$total_earned,
                avg_review_time_minutes=$avg_review_time_minutes,
                updated_at=time::now()
                RETURN AFTER;
            UPDATE $reviewer SET reputation_level=$level;
        COMMIT TRANSACTION;
        RETURN $stats[0];";

        let mut res = self
            .client
            .query(qry)
            .bind(("stats_id", stats_id(id)))
            .bind(("reviewer", id.clone()))
            .bind(("total_reviews", stats.total_reviews))
            .bind(("consensus_rate", stats.consensus_rate))
            .bind(("accuracy_score", stats.accuracy_score))
            .bind(("total_earned", stats.total_earned))
            .bind(("avg_review_time_minutes", stats.avg_review_time_minutes))
            .bind(("level", level))
            .await?;
        check_transaction_custom_error(&mut res)?;
        let saved: Option<ReviewerStatsEntity> = res.take(res.num_statements() - 1)?;
        saved.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }
}

impl Repository<ReviewerEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let stats_table = REVIEWER_STATS_TABLE_NAME;
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS name ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS payout_address ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS specializations ON TABLE {table_name} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS reputation_level ON TABLE {table_name} TYPE string
        ASSERT $value INSIDE ['novice', 'experienced', 'expert', 'master'];
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();

    DEFINE TABLE IF NOT EXISTS {stats_table} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS reviewer ON TABLE {stats_table} TYPE record<{table_name}>;
    DEFINE FIELD IF NOT EXISTS total_reviews ON TABLE {stats_table} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS consensus_rate ON TABLE {stats_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS accuracy_score ON TABLE {stats_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS total_earned ON TABLE {stats_table} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS avg_review_time_minutes ON TABLE {stats_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS updated_at ON TABLE {stats_table} TYPE option<datetime>;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
