use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ReviewTaskStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTaskEntity {
    pub id: Thing,
    pub package: Thing,
    pub task_type: String,
    pub required_reviews: u32,
    pub submission_count: u32,
    pub reward_pool: Amount,
    pub status: ReviewTaskStatus,
    pub stats_synced: bool,
    pub reference_query: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReviewTaskEntity {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn remaining(&self) -> u32 {
        self.required_reviews.saturating_sub(self.submission_count)
    }

    pub fn is_ready_for_consensus(&self) -> bool {
        self.status == ReviewTaskStatus::Open && self.submission_count >= self.required_reviews
    }
}

#[derive(Debug, Clone)]
pub struct ReviewTaskCreate {
    pub package: Thing,
    pub task_type: String,
    pub required_reviews: u32,
    pub reward_pool: Amount,
    pub expires_at: DateTime<Utc>,
    pub reference_query: Option<serde_json::Value>,
}

/// Row of the reviewer-facing task listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableTaskView {
    pub id: Thing,
    pub package_id: Thing,
    pub package_name: String,
    pub supplier_name: String,
    pub category: String,
    pub task_type: String,
    pub reward_pool: Amount,
    pub required_reviews: u32,
    pub submission_count: u32,
    pub current_rating: Option<f64>,
    pub reference_query: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Computed settlement of one submission, written by the consensus transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedPayout {
    pub submission: Thing,
    pub reviewer: Thing,
    pub is_consensus: bool,
    pub payout: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusPlan {
    /// Median overall rating; half points appear for even counts.
    pub median_overall: f64,
    pub reward_per_reviewer: Amount,
    pub entries: Vec<PlannedPayout>,
}
