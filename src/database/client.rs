use std::sync::Arc;

use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::info;

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::table_names::{
    BALANCE_TABLE_NAME, DATA_PACKAGE_TABLE_NAME, PAYOUT_ATTEMPT_TABLE_NAME,
    REVIEWER_TABLE_NAME, REVIEW_SUBMISSION_TABLE_NAME, REVIEW_TASK_TABLE_NAME,
    SETTLEMENT_RUN_TABLE_NAME, SUPPLIER_TABLE_NAME,
};
use crate::entities::balance::BalanceEntity;
use crate::entities::data_package::DataPackageEntity;
use crate::entities::payout::{PayoutAttemptEntity, SettlementRunEntity};
use crate::entities::review_submission::ReviewSubmissionEntity;
use crate::entities::review_task::ReviewTaskEntity;
use crate::entities::reviewer::ReviewerEntity;
use crate::entities::supplier::SupplierEntity;
use crate::middleware::error::{AppError, AppResult};

pub type Db = Surreal<Any>;

#[derive(Debug)]
pub struct DbConfig<'a> {
    pub url: &'a str,
    pub database: &'a str,
    pub namespace: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Debug)]
pub struct Database {
    pub client: Arc<Db>,
    pub suppliers: Repository<SupplierEntity>,
    pub data_packages: Repository<DataPackageEntity>,
    pub reviewers: Repository<ReviewerEntity>,
    pub review_tasks: Repository<ReviewTaskEntity>,
    pub review_submissions: Repository<ReviewSubmissionEntity>,
    pub balances: Repository<BalanceEntity>,
    pub payouts: Repository<PayoutAttemptEntity>,
    pub settlement_runs: Repository<SettlementRunEntity>,
}

impl Database {
    pub async fn connect(config: DbConfig<'_>) -> AppResult<Self> {
        info!("->> connecting DB url={} ns={}", config.url, config.namespace);
        let conn = connect(config.url).await?;

        if let (Some(password), Some(username)) = (config.password, config.username) {
            conn.signin(Root { username, password }).await?;
        }

        conn.use_ns(config.namespace)
            .use_db(config.database)
            .await?;

        let version = conn.version().await?;
        info!("->> connected DB version: {version}");

        let client = Arc::new(conn);
        Ok(Self {
            suppliers: Repository::new(client.clone(), SUPPLIER_TABLE_NAME.to_string()),
            data_packages: Repository::new(client.clone(), DATA_PACKAGE_TABLE_NAME.to_string()),
            reviewers: Repository::new(client.clone(), REVIEWER_TABLE_NAME.to_string()),
            review_tasks: Repository::new(client.clone(), REVIEW_TASK_TABLE_NAME.to_string()),
            review_submissions: Repository::new(
                client.clone(),
                REVIEW_SUBMISSION_TABLE_NAME.to_string(),
            ),
            balances: Repository::new(client.clone(), BALANCE_TABLE_NAME.to_string()),
            payouts: Repository::new(client.clone(), PAYOUT_ATTEMPT_TABLE_NAME.to_string()),
            settlement_runs: Repository::new(
                client.clone(),
                SETTLEMENT_RUN_TABLE_NAME.to_string(),
            ),
            client,
        })
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        self.suppliers.mutate_db().await?;
        self.data_packages.mutate_db().await?;
        self.reviewers.mutate_db().await?;
        self.review_tasks.mutate_db().await?;
        self.review_submissions.mutate_db().await?;
        self.balances.mutate_db().await?;
        self.payouts.mutate_db().await?;
        self.settlement_runs.mutate_db().await?;
        info!("->> migrations applied");
        Ok(())
    }
}
