use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SupplierStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierEntity {
    pub id: Thing,
    pub name: String,
    pub email: Option<String>,
    pub payout_address: Option<String>,
    pub status: SupplierStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SupplierCreate {
    pub name: String,
    pub email: Option<String>,
    pub payout_address: Option<String>,
}
