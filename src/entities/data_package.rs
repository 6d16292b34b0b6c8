use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::review_submission::RecentReviewView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PackageStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPackageEntity {
    pub id: Thing,
    pub supplier: Thing,
    pub name: String,
    pub category: String,
    pub price_per_query: Amount,
    pub endpoint_url: Option<String>,
    pub status: PackageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DataPackageCreate {
    pub supplier: Thing,
    pub name: String,
    pub category: String,
    pub price_per_query: Amount,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageQualityEntity {
    pub id: Thing,
    pub package: Thing,
    pub avg_quality_score: f64,
    pub avg_timeliness_score: f64,
    pub avg_schema_score: f64,
    pub overall_rating: f64,
    pub total_reviews: u32,
    /// Set by an external analytic pass, carried as is.
    pub quality_trend: Option<String>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

/// Averages of one settled task's submissions, applied on top of the running count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageQualityUpdate {
    pub avg_quality_score: f64,
    pub avg_timeliness_score: f64,
    pub avg_schema_score: f64,
    pub overall_rating: f64,
    pub review_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackageQualityView {
    pub package_id: Thing,
    pub package_name: String,
    pub quality: Option<PackageQualityEntity>,
    pub recent_reviews: Vec<RecentReviewView>,
}
