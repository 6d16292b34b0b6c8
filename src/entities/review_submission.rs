use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::table_names::REVIEW_SUBMISSION_TABLE_NAME;
use crate::entities::amount::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmissionEntity {
    pub id: Thing,
    pub task: Thing,
    pub reviewer: Thing,
    pub quality_score: u8,
    pub timeliness_score: u8,
    pub schema_compliance_score: u8,
    pub overall_rating: u8,
    pub findings: String,
    pub evidence: Option<serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
    /// Written once, by the consensus transaction.
    pub is_consensus: Option<bool>,
    pub payout: Option<Amount>,
}

#[derive(Debug, Clone)]
pub struct ReviewSubmissionCreate {
    pub task: Thing,
    pub reviewer: Thing,
    pub quality_score: u8,
    pub timeliness_score: u8,
    pub schema_compliance_score: u8,
    pub overall_rating: u8,
    pub findings: String,
    pub evidence: Option<serde_json::Value>,
}

/// One reviewer may hold one submission per task, so the pair is the record key.
pub fn submission_id(task: &Thing, reviewer: &Thing) -> Thing {
    let key = format!("{}_{}", task.id.to_raw(), reviewer.id.to_raw());
    Thing::from((REVIEW_SUBMISSION_TABLE_NAME, key.as_str()))
}

/// Settled submission joined with its task creation time, input of the reputation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledSubmission {
    pub is_consensus: bool,
    pub payout: Amount,
    pub submitted_at: DateTime<Utc>,
    pub task_created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentReviewView {
    pub rating: u8,
    pub reviewer: String,
    pub findings: String,
    pub date: DateTime<Utc>,
}
