use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::{Id, Thing};

use crate::database::repository_impl::Repository;
use crate::database::repository_traits::RepositoryCore;
use crate::database::surrdb_utils::check_transaction_custom_error;
use crate::database::table_names::{PACKAGE_QUALITY_TABLE_NAME, SUPPLIER_TABLE_NAME};
use crate::entities::data_package::{
    DataPackageCreate, DataPackageEntity, PackageQualityEntity, PackageQualityUpdate,
    PackageStatus,
};
use crate::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

fn quality_id(package: &Thing) -> Thing {
    Thing::from((PACKAGE_QUALITY_TABLE_NAME, package.id.to_raw().as_str()))
}

#[async_trait]
impl DataPackageRepositoryInterface for Repository<DataPackageEntity> {
    async fn create(&self, data: DataPackageCreate) -> AppResult<DataPackageEntity> {
        let id = Thing::from((self.table_name.as_str(), Id::ulid()));
        let qry = "
        BEGIN TRANSACTION;
            LET $package = CREATE $id SET
                supplier=$supplier,
                name=$name,
                category=$category,
                price_per_query=$price,
                endpoint_url=$endpoint_url,
                status=$status
                RETURN AFTER;
            CREATE $quality_id SET package=$id, avg_quality_score=0.0, avg_timeliness_score=0.0,
                avg_schema_score=0.0, overall_rating=0.0, total_reviews=0;
        COMMIT TRANSACTION;
        RETURN $package[0];";

        let mut res = self
            .client
            .query(qry)
            .bind(("id", id.clone()))
            .bind(("supplier", data.supplier))
            .bind(("name", data.name))
            .bind(("category", data.category))
            .bind(("price", data.price_per_query))
            .bind(("endpoint_url", data.endpoint_url))
            .bind(("status", PackageStatus::Active))
            .bind(("quality_id", quality_id(&id)))
            .await?;
        check_transaction_custom_error(&mut res)?;
        let created: Option<DataPackageEntity> = res.take(res.num_statements() - 1)?;
        created.ok_or(AppError::EntityFailIdNotFound {
            ident: id.to_raw(),
        })
    }

    async fn get(&self, id: &Thing) -> AppResult<Option<DataPackageEntity>> {
        self.item_by_id(id).await
    }

    async fn get_quality(&self, id: &Thing) -> AppResult<Option<PackageQualityEntity>> {
        let mut res = self
            .client
            .query("SELECT * FROM ONLY $id;")
            .bind(("id", quality_id(id)))
            .await?;
        Ok(res.take::<Option<PackageQualityEntity>>(0)?)
    }

    fn build_quality_update_query<'b>(
        &self,
        query: Query<'b, Any>,
        package: &Thing,
        update: &PackageQualityUpdate,
    ) -> Query<'b, Any> {
        query
            .query(
                "UPSERT $quality_id SET
                    package=$quality_package,
                    avg_quality_score=$q_quality,
                    avg_timeliness_score=$q_timeliness,
                    avg_schema_score=$q_schema,
                    overall_rating=$q_overall,
                    total_reviews+=$q_count,
                    last_reviewed=time::now();",
            )
            .bind(("quality_id", quality_id(package)))
            .bind(("quality_package", package.clone()))
            .bind(("q_quality", update.avg_quality_score))
            .bind(("q_timeliness", update.avg_timeliness_score))
            .bind(("q_schema", update.avg_schema_score))
            .bind(("q_overall", update.overall_rating))
            .bind(("q_count", update.review_count))
    }
}

impl Repository<DataPackageEntity> {
    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let table_name = self.table_name.as_str();
        let quality_table = PACKAGE_QUALITY_TABLE_NAME;
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {table_name} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS supplier ON TABLE {table_name} TYPE record<{SUPPLIER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS name ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS category ON TABLE {table_name} TYPE string;
    DEFINE FIELD IF NOT EXISTS price_per_query ON TABLE {table_name} TYPE int ASSERT $value >= 0;
    DEFINE FIELD IF NOT EXISTS endpoint_url ON TABLE {table_name} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {table_name} TYPE string ASSERT $value INSIDE ['active', 'inactive'];
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {table_name} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS supplier_idx ON TABLE {table_name} COLUMNS supplier;

    DEFINE TABLE IF NOT EXISTS {quality_table} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS package ON TABLE {quality_table} TYPE record<{table_name}>;
    DEFINE FIELD IF NOT EXISTS avg_quality_score ON TABLE {quality_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS avg_timeliness_score ON TABLE {quality_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS avg_schema_score ON TABLE {quality_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS overall_rating ON TABLE {quality_table} TYPE float DEFAULT 0.0;
    DEFINE FIELD IF NOT EXISTS total_reviews ON TABLE {quality_table} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS quality_trend ON TABLE {quality_table} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS last_reviewed ON TABLE {quality_table} TYPE option<datetime>;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}
