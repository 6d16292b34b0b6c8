use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReputationLevel {
    Novice,
    Experienced,
    Expert,
    Master,
}

impl ReputationLevel {
    /// First matching tier wins, highest first.
    pub fn for_record(total_reviews: u32, consensus_rate: f64) -> Self {
        if total_reviews >= 100 && consensus_rate >= 0.9 {
            ReputationLevel::Master
        } else if total_reviews >= 50 && consensus_rate >= 0.8 {
            ReputationLevel::Expert
        } else if total_reviews >= 20 && consensus_rate >= 0.7 {
            ReputationLevel::Experienced
        } else {
            ReputationLevel::Novice
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerEntity {
    pub id: Thing,
    pub name: String,
    pub email: Option<String>,
    pub payout_address: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub reputation_level: ReputationLevel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewerCreate {
    pub name: String,
    pub email: Option<String>,
    pub payout_address: Option<String>,
    pub specializations: Vec<String>,
}

/// Rolling statistics of one reviewer, always recomputed from settled submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub total_reviews: u32,
    pub consensus_rate: f64,
    pub accuracy_score: f64,
    pub total_earned: Amount,
    pub avg_review_time_minutes: f64,
}

impl Default for ReviewerStats {
    fn default() -> Self {
        Self {
            total_reviews: 0,
            consensus_rate: 0.0,
            accuracy_score: 0.0,
            total_earned: Amount::ZERO,
            avg_review_time_minutes: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerStatsEntity {
    pub id: Thing,
    pub reviewer: Thing,
    pub total_reviews: u32,
    pub consensus_rate: f64,
    pub accuracy_score: f64,
    pub total_earned: Amount,
    pub avg_review_time_minutes: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewerStatsView {
    pub reviewer_id: Thing,
    pub reputation_level: ReputationLevel,
    pub total_reviews: u32,
    pub consensus_rate: f64,
    pub accuracy_score: f64,
    pub total_earned: Amount,
    pub avg_review_time_minutes: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_strict_order() {
        assert_eq!(ReputationLevel::for_record(105, 0.92), ReputationLevel::Master);
        assert_eq!(ReputationLevel::for_record(60, 0.82), ReputationLevel::Expert);
        assert_eq!(ReputationLevel::for_record(25, 0.5), ReputationLevel::Novice);
        assert_eq!(ReputationLevel::for_record(25, 0.7), ReputationLevel::Experienced);
        // volume without agreement stays low
        assert_eq!(ReputationLevel::for_record(150, 0.85), ReputationLevel::Expert);
        assert_eq!(ReputationLevel::for_record(99, 0.99), ReputationLevel::Expert);
        assert_eq!(ReputationLevel::for_record(0, 0.0), ReputationLevel::Novice);
    }

    #[test]
    fn level_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReputationLevel::Experienced).unwrap(),
            "\"experienced\""
        );
        assert_eq!(ReputationLevel::Master.to_string(), "master");
    }
}
