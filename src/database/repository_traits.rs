use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::middleware::error::AppResult;

/// Table-bound access shared by every entity repository.
#[async_trait]
pub trait RepositoryCore {
    type Connection;
    type Entity;

    fn new(conn: Self::Connection, table_name: String) -> Self
    where
        Self: Sized;

    /// `None` for ids of other tables.
    async fn item_by_id(&self, id: &Thing) -> AppResult<Option<Self::Entity>>;
}
