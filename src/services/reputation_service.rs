use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::review_submission::SettledSubmission;
use crate::entities::reviewer::{ReputationLevel, ReviewerStats, ReviewerStatsView};
use crate::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use crate::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

/// Full recomputation from settled submissions; nothing is patched incrementally.
pub fn aggregate_stats(history: &[SettledSubmission]) -> ReviewerStats {
    if history.is_empty() {
        return ReviewerStats::default();
    }
    let total = history.len();
    let in_consensus = history.iter().filter(|s| s.is_consensus).count();
    let consensus_rate = in_consensus as f64 / total as f64;
    let total_earned: Amount = history.iter().map(|s| s.payout).sum();
    let minutes: f64 = history
        .iter()
        .map(|s| {
            let elapsed = s.submitted_at - s.task_created_at;
            elapsed.num_seconds().max(0) as f64 / 60.0
        })
        .sum();

    ReviewerStats {
        total_reviews: total as u32,
        consensus_rate,
        accuracy_score: (consensus_rate * 10.0).min(10.0),
        total_earned,
        avg_review_time_minutes: minutes / total as f64,
    }
}

pub struct ReputationService<'a, S, R>
where
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    submissions: &'a S,
    reviewers: &'a R,
}

impl<'a, S, R> ReputationService<'a, S, R>
where
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    pub fn new(submissions: &'a S, reviewers: &'a R) -> Self {
        Self {
            submissions,
            reviewers,
        }
    }

    pub async fn recompute(&self, reviewer: &Thing) -> AppResult<ReviewerStatsView> {
        let history = self.submissions.list_settled_by_reviewer(reviewer).await?;
        let stats = aggregate_stats(&history);
        let level = ReputationLevel::for_record(stats.total_reviews, stats.consensus_rate);
        self.reviewers.save_stats(reviewer, &stats, level).await?;
        tracing::debug!(reviewer = %reviewer, total = stats.total_reviews, %level, "reputation recomputed");
        Ok(ReviewerStatsView {
            reviewer_id: reviewer.clone(),
            reputation_level: level,
            total_reviews: stats.total_reviews,
            consensus_rate: stats.consensus_rate,
            accuracy_score: stats.accuracy_score,
            total_earned: stats.total_earned,
            avg_review_time_minutes: stats.avg_review_time_minutes,
        })
    }

    pub async fn get_stats(&self, reviewer_id: &Thing) -> AppResult<ReviewerStatsView> {
        let not_found = || AppError::EntityFailIdNotFound {
            ident: reviewer_id.to_raw(),
        };
        let reviewer = self.reviewers.get(reviewer_id).await?.ok_or_else(not_found)?;
        let stats = self.reviewers.get_stats(reviewer_id).await?.ok_or_else(not_found)?;
        Ok(ReviewerStatsView {
            reviewer_id: reviewer.id,
            reputation_level: reviewer.reputation_level,
            total_reviews: stats.total_reviews,
            consensus_rate: stats.consensus_rate,
            accuracy_score: stats.accuracy_score,
            total_earned: stats.total_earned,
            avg_review_time_minutes: stats.avg_review_time_minutes,
        })
    }
}
