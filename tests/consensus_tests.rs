mod helpers;

use axum::http::StatusCode;
use futures::future::join_all;
use squidpro_server::database::repository_impl::Repository;
use squidpro_server::database::surrdb_utils::check_transaction_custom_error;
use squidpro_server::entities::amount::Amount;
use squidpro_server::entities::balance::{AccountKey, BalanceEntity};
use squidpro_server::entities::data_package::{DataPackageEntity, PackageQualityView};
use squidpro_server::entities::review_submission::{ReviewSubmissionCreate, ReviewSubmissionEntity};
use squidpro_server::entities::review_task::{ReviewTaskEntity, ReviewTaskStatus};
use squidpro_server::entities::reviewer::{ReputationLevel, ReviewerEntity, ReviewerStatsView};
use squidpro_server::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use squidpro_server::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use squidpro_server::interfaces::repositories::review_task_ifce::ReviewTaskRepositoryInterface;
use squidpro_server::middleware::error::AppError;
use squidpro_server::middleware::mw_ctx::CtxState;
use squidpro_server::services::consensus_service::ConsensusService;

use crate::helpers::{admin_token, create_open_task, create_reviewer, reviewer_token, submit_review};

/// Stores a submission without running the engine, like a process that died right after commit.
async fn store_submission(state: &CtxState, task: &ReviewTaskEntity, reviewer: &ReviewerEntity, rating: u8) {
    let data = ReviewSubmissionCreate {
        task: task.id.clone(),
        reviewer: reviewer.id.clone(),
        quality_score: rating,
        timeliness_score: 7,
        schema_compliance_score: 8,
        overall_rating: rating,
        findings: "stored directly".to_string(),
        evidence: None,
    };
    let mut query = state.db.client.query("BEGIN TRANSACTION");
    query = state.db.review_tasks.build_claim_slot_query(query, &task.id);
    query = state.db.review_submissions.build_create_query(query, &data);
    let mut res = query.query("COMMIT TRANSACTION").await.unwrap();
    check_transaction_custom_error(&mut res).unwrap();
}

async fn balance_of(state: &CtxState, reviewer: &ReviewerEntity) -> Amount {
    state
        .db
        .balances
        .get(&AccountKey::reviewer(reviewer.id.id.to_raw()))
        .await
        .unwrap()
        .unwrap()
        .balance
}

fn consensus_service(
    state: &CtxState,
) -> ConsensusService<
    '_,
    Repository<ReviewTaskEntity>,
    Repository<ReviewSubmissionEntity>,
    Repository<BalanceEntity>,
    Repository<DataPackageEntity>,
    Repository<ReviewerEntity>,
> {
    ConsensusService::new(
        &state.db.client,
        &state.db.review_tasks,
        &state.db.review_submissions,
        &state.db.balances,
        &state.db.data_packages,
        &state.db.reviewers,
    )
}

test_with_server!(consensus_classifies_and_pays, |server, ctx_state, _config, _rail| {
    let (_, package, task) = create_open_task(&ctx_state, 3, "0.30").await;
    let mut reviewers = vec![];
    for rating in [5, 6, 9] {
        let reviewer = create_reviewer(&ctx_state, None).await;
        submit_review(&server, &reviewer_token(&ctx_state, &reviewer), &task, rating)
            .await
            .assert_status_success();
        reviewers.push(reviewer);
    }

    assert_eq!(balance_of(&ctx_state, &reviewers[0]).await, Amount::from_micros(120_000));
    assert_eq!(balance_of(&ctx_state, &reviewers[1]).await, Amount::from_micros(120_000));
    assert_eq!(balance_of(&ctx_state, &reviewers[2]).await, Amount::from_micros(80_000));

    let submissions = ctx_state.db.review_submissions.list_by_task(&task.id).await.unwrap();
    assert_eq!(submissions.len(), 3);
    for submission in submissions {
        let expected = submission.overall_rating != 9;
        assert_eq!(submission.is_consensus, Some(expected));
        assert!(submission.payout.is_some());
    }

    let stored = ctx_state.db.review_tasks.get(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReviewTaskStatus::Completed);
    assert!(stored.completed_at.is_some());
    assert!(stored.stats_synced);

    let quality = server
        .get(&format!("/api/packages/{}/quality", package.id.id.to_raw()))
        .await
        .json::<PackageQualityView>();
    let row = quality.quality.unwrap();
    assert_eq!(row.total_reviews, 3);
    assert!((row.overall_rating - 20.0 / 3.0).abs() < 1e-9);
    assert!((row.avg_quality_score - 8.0).abs() < 1e-9);
    assert_eq!(quality.recent_reviews.len(), 3);

    let stats = server
        .get(&format!("/api/reviewers/{}/stats", reviewers[2].id.id.to_raw()))
        .add_header(
            "Authorization",
            format!("Bearer {}", reviewer_token(&ctx_state, &reviewers[0])),
        )
        .await
        .json::<ReviewerStatsView>();
    assert_eq!(stats.total_reviews, 1);
    assert_eq!(stats.consensus_rate, 0.0);
    assert_eq!(stats.total_earned, Amount::from_micros(80_000));
    assert_eq!(stats.reputation_level, ReputationLevel::Novice);
});

test_with_server!(consensus_applies_once, |_server, ctx_state, _config, _rail| {
    let (_, _, task) = create_open_task(&ctx_state, 2, "0.20").await;
    let first = create_reviewer(&ctx_state, None).await;
    let second = create_reviewer(&ctx_state, None).await;
    store_submission(&ctx_state, &task, &first, 7).await;
    store_submission(&ctx_state, &task, &second, 8).await;

    let service = consensus_service(&ctx_state);
    let results = join_all((0..5).map(|_| service.run(&task.id))).await;
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, AppError::Conflict { .. }), "unexpected {err:?}");
    }

    let again = service.run(&task.id).await;
    assert!(matches!(again, Err(AppError::Conflict { .. })));

    assert_eq!(balance_of(&ctx_state, &first).await, Amount::from_micros(120_000));
    assert_eq!(balance_of(&ctx_state, &second).await, Amount::from_micros(120_000));
});

test_with_server!(redrive_settles_lost_trigger, |_server, ctx_state, _config, _rail| {
    let (_, _, task) = create_open_task(&ctx_state, 2, "0.10").await;
    let first = create_reviewer(&ctx_state, None).await;
    let second = create_reviewer(&ctx_state, None).await;
    store_submission(&ctx_state, &task, &first, 3).await;
    store_submission(&ctx_state, &task, &second, 9).await;

    let report = consensus_service(&ctx_state).redrive_pending().await.unwrap();
    assert_eq!(report.settled, 1);
    assert_eq!(report.failed, 0);

    let stored = ctx_state.db.review_tasks.get(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReviewTaskStatus::Completed);
    assert!(stored.stats_synced);
    // median 6: both ratings sit exactly 3 away
    assert_eq!(balance_of(&ctx_state, &first).await, Amount::from_micros(40_000));
    assert_eq!(balance_of(&ctx_state, &second).await, Amount::from_micros(40_000));

    let report = consensus_service(&ctx_state).redrive_pending().await.unwrap();
    assert_eq!(report.settled + report.resynced + report.failed, 0);
});

test_with_server!(redrive_finishes_reputation_pass, |_server, ctx_state, _config, _rail| {
    let (_, _, task) = create_open_task(&ctx_state, 2, "0.10").await;
    let first = create_reviewer(&ctx_state, None).await;
    let second = create_reviewer(&ctx_state, None).await;
    store_submission(&ctx_state, &task, &first, 7).await;
    store_submission(&ctx_state, &task, &second, 7).await;
    consensus_service(&ctx_state).run(&task.id).await.unwrap();

    ctx_state
        .db
        .client
        .query("UPDATE $id SET stats_synced = false;")
        .bind(("id", task.id.clone()))
        .await
        .unwrap();

    let report = consensus_service(&ctx_state).redrive_pending().await.unwrap();
    assert_eq!(report.resynced, 1);
    let stored = ctx_state.db.review_tasks.get(&task.id).await.unwrap().unwrap();
    assert!(stored.stats_synced);
});

test_with_server!(admin_forces_consensus_on_partial_task, |server, ctx_state, _config, _rail| {
    let (_, _, task) = create_open_task(&ctx_state, 3, "0.30").await;
    let first = create_reviewer(&ctx_state, None).await;
    let second = create_reviewer(&ctx_state, None).await;
    let url = format!("/api/admin/review_tasks/{}/consensus", task.id.id.to_raw());

    store_submission(&ctx_state, &task, &first, 6).await;
    server
        .post(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    store_submission(&ctx_state, &task, &second, 7).await;
    server
        .post(&url)
        .add_header(
            "Authorization",
            format!("Bearer {}", reviewer_token(&ctx_state, &first)),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .post(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await;
    response.assert_status_success();
    let plan = response.json::<serde_json::Value>();
    assert_eq!(plan["median_overall"], 6.5);
    assert_eq!(plan["reward_per_reviewer"], 150_000);

    server
        .post(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await
        .assert_status(StatusCode::CONFLICT);
});

test_with_server!(admin_creates_task_with_defaults, |server, ctx_state, _config, _rail| {
    let (_, package, _) = create_open_task(&ctx_state, 3, "0.30").await;
    let response = server
        .post("/api/admin/review_tasks")
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .json(&serde_json::json!({
            "package_id": package.id.id.to_raw(),
            "task_type": "schema_validation"
        }))
        .await;
    response.assert_status_success();
    let task = response.json::<ReviewTaskEntity>();
    assert_eq!(task.required_reviews, 3);
    assert_eq!(task.reward_pool, Amount::from_micros(50_000));
    assert_eq!(task.status, ReviewTaskStatus::Open);
    let hours = (task.expires_at - task.created_at).num_hours();
    assert!((71..=72).contains(&hours));

    server
        .post("/api/admin/review_tasks")
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .json(&serde_json::json!({
            "package_id": "missing",
            "task_type": "schema_validation"
        }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
});
