use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::database::repository_traits::RepositoryCore;
use crate::middleware::error::AppResult;

#[derive(Debug)]
pub struct Repository<E> {
    pub client: Arc<Db>,
    pub table_name: String,
    _entity: PhantomData<E>,
}

#[async_trait]
impl<E: DeserializeOwned + Send + Sync + 'static> RepositoryCore for Repository<E> {
    type Connection = Arc<Db>;
    type Entity = E;

    fn new(client: Self::Connection, table_name: String) -> Self {
        Repository {
            client,
            table_name,
            _entity: PhantomData,
        }
    }

    async fn item_by_id(&self, id: &Thing) -> AppResult<Option<E>> {
        if id.tb != self.table_name {
            return Ok(None);
        }
        let mut res = self
            .client
            .query("SELECT * FROM ONLY $id;")
            .bind(("id", id.clone()))
            .await?;
        Ok(res.take::<Option<E>>(0)?)
    }
}
