use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::Thing;

use crate::entities::data_package::{
    DataPackageCreate, DataPackageEntity, PackageQualityEntity, PackageQualityUpdate,
};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait DataPackageRepositoryInterface {
    /// Also creates the package's empty quality row.
    async fn create(&self, data: DataPackageCreate) -> AppResult<DataPackageEntity>;
    async fn get(&self, id: &Thing) -> AppResult<Option<DataPackageEntity>>;
    async fn get_quality(&self, id: &Thing) -> AppResult<Option<PackageQualityEntity>>;

    fn build_quality_update_query<'b>(
        &self,
        query: Query<'b, Any>,
        package: &Thing,
        update: &PackageQualityUpdate,
    ) -> Query<'b, Any>;
}
