use std::collections::HashSet;

use serde::Serialize;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::database::surrdb_utils::{
    check_transaction_custom_error, with_conflict_retry, THROW_TASK_COMPLETED,
};
use crate::entities::amount::Amount;
use crate::entities::balance::AccountKey;
use crate::entities::review_submission::ReviewSubmissionEntity;
use crate::entities::review_task::{ConsensusPlan, PlannedPayout, ReviewTaskEntity, ReviewTaskStatus};
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use crate::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use crate::interfaces::repositories::review_task_ifce::ReviewTaskRepositoryInterface;
use crate::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};
use crate::services::package_quality_service::batch_update;
use crate::services::reputation_service::ReputationService;

/// Allowed distance from the median, doubled like the median itself.
const CONSENSUS_BAND_X2: u32 = 4;
const CONSENSUS_MULTIPLIER: (i64, i64) = (12, 10);
const DIVERGENT_MULTIPLIER: (i64, i64) = (8, 10);

/// Twice the median, so even counts stay in integers.
pub fn median_x2(ratings: &[u8]) -> Option<u32> {
    if ratings.is_empty() {
        return None;
    }
    let mut sorted = ratings.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        sorted[mid - 1] as u32 + sorted[mid] as u32
    } else {
        sorted[mid] as u32 * 2
    };
    Some(median)
}

pub fn is_consensus(rating: u8, median_x2: u32) -> bool {
    (rating as u32 * 2).abs_diff(median_x2) <= CONSENSUS_BAND_X2
}

pub fn evaluate(reward_pool: Amount, submissions: &[ReviewSubmissionEntity]) -> AppResult<ConsensusPlan> {
    if submissions.len() < 2 {
        return Err(AppError::InvariantViolation {
            description: format!(
                "consensus needs at least 2 submissions, got {}",
                submissions.len()
            ),
        });
    }
    let ratings: Vec<u8> = submissions.iter().map(|s| s.overall_rating).collect();
    let median = median_x2(&ratings).unwrap_or_default();
    let reward_per_reviewer = reward_pool.split_evenly(submissions.len());

    let entries = submissions
        .iter()
        .map(|s| {
            let in_consensus = is_consensus(s.overall_rating, median);
            let (num, den) = if in_consensus {
                CONSENSUS_MULTIPLIER
            } else {
                DIVERGENT_MULTIPLIER
            };
            PlannedPayout {
                submission: s.id.clone(),
                reviewer: s.reviewer.clone(),
                is_consensus: in_consensus,
                payout: reward_per_reviewer.scale(num, den),
            }
        })
        .collect();

    Ok(ConsensusPlan {
        median_overall: median as f64 / 2.0,
        reward_per_reviewer,
        entries,
    })
}

#[derive(Debug, Default, Serialize)]
pub struct RedriveReport {
    pub settled: u32,
    pub resynced: u32,
    pub failed: u32,
}

pub struct ConsensusService<'a, T, S, B, P, R>
where
    T: ReviewTaskRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
    P: DataPackageRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    db: &'a Db,
    tasks: &'a T,
    submissions: &'a S,
    balances: &'a B,
    packages: &'a P,
    reputation: ReputationService<'a, S, R>,
}

impl<'a, T, S, B, P, R> ConsensusService<'a, T, S, B, P, R>
where
    T: ReviewTaskRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
    P: DataPackageRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
{
    pub fn new(
        db: &'a Db,
        tasks: &'a T,
        submissions: &'a S,
        balances: &'a B,
        packages: &'a P,
        reviewers: &'a R,
    ) -> Self {
        Self {
            db,
            tasks,
            submissions,
            balances,
            packages,
            reputation: ReputationService::new(submissions, reviewers),
        }
    }

    /// Settles one task. Only the caller that moves the task out of `Open` gets `Ok`,
    /// every other caller gets `Conflict` and changes nothing.
    pub async fn run(&self, task_id: &Thing) -> AppResult<ConsensusPlan> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: task_id.to_raw(),
            })?;
        if task.status == ReviewTaskStatus::Completed {
            return Err(AppError::Conflict {
                description: THROW_TASK_COMPLETED.to_string(),
            });
        }

        let task_ref = &task;
        let plan = with_conflict_retry(|| async move { self.settle(task_ref).await })
            .await
            .inspect_err(|err| {
                if matches!(err, AppError::InvariantViolation { .. }) {
                    tracing::error!(task = %task.id, "consensus invariant violated: {err:?}");
                }
            })?;

        tracing::info!(
            task = %task.id,
            median = plan.median_overall,
            reward_per_reviewer = %plan.reward_per_reviewer,
            reviewers = plan.entries.len(),
            "consensus settled"
        );

        let reviewers: Vec<Thing> = plan.entries.iter().map(|e| e.reviewer.clone()).collect();
        if let Err(err) = self.sync_reviewers(&task.id, &reviewers).await {
            tracing::warn!(task = %task.id, "reputation sync deferred: {err}");
        }
        Ok(plan)
    }

    async fn settle(&self, task: &ReviewTaskEntity) -> AppResult<ConsensusPlan> {
        let submissions = self.submissions.list_by_task(&task.id).await?;
        let plan = evaluate(task.reward_pool, &submissions)?;
        let quality = batch_update(&submissions);

        let mut query = self.db.query("BEGIN TRANSACTION");
        query = self
            .tasks
            .build_complete_query(query, &task.id, submissions.len() as u32);
        for (index, entry) in plan.entries.iter().enumerate() {
            query = self.submissions.build_settle_query(query, index, entry);
            let account = AccountKey::reviewer(entry.reviewer.id.to_raw());
            query = self
                .balances
                .build_credit_query(query, index, &account, entry.payout);
        }
        query = self
            .packages
            .build_quality_update_query(query, &task.package, &quality);
        let mut res = query.query("COMMIT TRANSACTION").await?;
        check_transaction_custom_error(&mut res)?;
        Ok(plan)
    }

    async fn sync_reviewers(&self, task_id: &Thing, reviewers: &[Thing]) -> AppResult<()> {
        for reviewer in reviewers {
            self.reputation.recompute(reviewer).await?;
        }
        self.tasks.mark_stats_synced(task_id).await
    }

    /// Settles full tasks whose trigger was lost and finishes interrupted reputation passes.
    pub async fn redrive_pending(&self) -> AppResult<RedriveReport> {
        let mut report = RedriveReport::default();

        for task in self.tasks.list_ready_for_consensus().await? {
            match self.run(&task.id).await {
                Ok(_) => report.settled += 1,
                Err(AppError::Conflict { .. }) => {}
                Err(err) => {
                    tracing::warn!(task = %task.id, "consensus re-drive failed: {err}");
                    report.failed += 1;
                }
            }
        }

        for task in self.tasks.list_unsynced().await? {
            let reviewers: Vec<Thing> = self
                .submissions
                .list_by_task(&task.id)
                .await?
                .into_iter()
                .map(|s| s.reviewer)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            match self.sync_reviewers(&task.id, &reviewers).await {
                Ok(()) => report.resynced += 1,
                Err(err) => {
                    tracing::warn!(task = %task.id, "reputation re-sync failed: {err}");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn submissions(ratings: &[u8]) -> Vec<ReviewSubmissionEntity> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, rating)| ReviewSubmissionEntity {
                id: Thing::from(("review_submission", format!("t_r{i}").as_str())),
                task: Thing::from(("review_task", "t")),
                reviewer: Thing::from(("reviewer", format!("r{i}").as_str())),
                quality_score: 7,
                timeliness_score: 7,
                schema_compliance_score: 7,
                overall_rating: *rating,
                findings: "fine".to_string(),
                evidence: None,
                submitted_at: Utc::now(),
                is_consensus: None,
                payout: None,
            })
            .collect()
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        assert_eq!(median_x2(&[9, 5, 6]), Some(12));
        assert_eq!(median_x2(&[5, 6, 8, 9]), Some(14));
        assert_eq!(median_x2(&[]), None);
    }

    #[test]
    fn band_is_inclusive() {
        assert!(is_consensus(4, 12));
        assert!(is_consensus(8, 12));
        assert!(!is_consensus(9, 12));
        // median 7.5: 5.5 and 9.5 are the edges
        assert!(!is_consensus(5, 15));
        assert!(is_consensus(9, 15));
    }

    #[test]
    fn classifies_five_six_nine() {
        let plan = evaluate(Amount::from_micros(300_000), &submissions(&[5, 6, 9])).unwrap();
        assert_eq!(plan.median_overall, 6.0);
        let flags: Vec<bool> = plan.entries.iter().map(|e| e.is_consensus).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn payouts_use_exact_multipliers() {
        let pool: Amount = "0.30".parse().unwrap();
        let plan = evaluate(pool, &submissions(&[5, 6, 9])).unwrap();
        assert_eq!(plan.reward_per_reviewer, Amount::from_micros(100_000));
        let payouts: Vec<Amount> = plan.entries.iter().map(|e| e.payout).collect();
        assert_eq!(
            payouts,
            vec![
                Amount::from_micros(120_000),
                Amount::from_micros(120_000),
                Amount::from_micros(80_000)
            ]
        );
        assert_eq!(payouts[0].to_string(), "0.120000");
        assert_eq!(payouts[2].to_string(), "0.080000");
    }

    #[test]
    fn single_submission_is_a_defect() {
        let err = evaluate(Amount::from_units(1), &submissions(&[7])).unwrap_err();
        assert!(matches!(err, AppError::InvariantViolation { .. }));
    }
}
