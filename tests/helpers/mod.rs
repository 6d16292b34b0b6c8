pub mod test_with_server;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use chrono::Utc;
use fake::{faker::name::en::Name, Fake};
use serde_json::json;
use squidpro_server::entities::amount::Amount;
use squidpro_server::entities::balance::AccountKey;
use squidpro_server::entities::data_package::{DataPackageCreate, DataPackageEntity};
use squidpro_server::entities::payout::SettlementRunEntity;
use squidpro_server::entities::review_task::{ReviewTaskCreate, ReviewTaskEntity};
use squidpro_server::entities::reviewer::{ReviewerCreate, ReviewerEntity};
use squidpro_server::entities::supplier::{SupplierCreate, SupplierEntity};
use squidpro_server::interfaces::payment_rail::{
    PaymentRailError, PaymentRailInterface, PaymentRequest,
};
use squidpro_server::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use squidpro_server::interfaces::repositories::review_task_ifce::ReviewTaskRepositoryInterface;
use squidpro_server::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use squidpro_server::interfaces::repositories::supplier_ifce::SupplierRepositoryInterface;
use squidpro_server::middleware::mw_ctx::CtxState;
use squidpro_server::services::ledger_service::LedgerService;
use squidpro_server::services::settlement_service::SettlementService;
use squidpro_server::utils::jwt::CallerRole;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RailMode {
    #[default]
    Succeed,
    Reject,
    /// Succeeds after a short pause, long enough for a competing run to arrive.
    Slow,
    /// Never answers, the caller's timeout decides.
    Hang,
    Transport,
}

/// Scripted payment rail. Requests are deduplicated by idempotency key, so `sent`
/// holds one entry per distinct transfer.
#[derive(Default)]
pub struct MockPaymentRail {
    mode: Mutex<RailMode>,
    sent: Mutex<Vec<PaymentRequest>>,
    executed: Mutex<HashMap<String, String>>,
}

#[allow(dead_code)]
impl MockPaymentRail {
    pub fn set_mode(&self, mode: RailMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn sent(&self) -> Vec<PaymentRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// A transfer that happened at the rail without the caller seeing the answer.
    pub fn mark_executed(&self, idempotency_key: &str, tx_ref: &str) {
        self.executed
            .lock()
            .unwrap()
            .insert(idempotency_key.to_string(), tx_ref.to_string());
    }

    fn execute(&self, request: &PaymentRequest) -> String {
        let tx_ref = format!("0xtx_{}", request.idempotency_key);
        self.mark_executed(&request.idempotency_key, &tx_ref);
        tx_ref
    }
}

#[async_trait]
impl PaymentRailInterface for MockPaymentRail {
    async fn send_payment(&self, request: &PaymentRequest) -> Result<String, PaymentRailError> {
        {
            let mut sent = self.sent.lock().unwrap();
            if !sent.iter().any(|r| r.idempotency_key == request.idempotency_key) {
                sent.push(request.clone());
            }
        }
        let replayed = self.executed.lock().unwrap().get(&request.idempotency_key).cloned();
        if let Some(tx_ref) = replayed {
            return Ok(tx_ref);
        }
        let mode = *self.mode.lock().unwrap();
        match mode {
            RailMode::Succeed => Ok(self.execute(request)),
            RailMode::Slow => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(self.execute(request))
            }
            RailMode::Reject => Err(PaymentRailError::Rejected(
                "invalid destination".to_string(),
            )),
            RailMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(PaymentRailError::Transport("hung up".to_string()))
            }
            RailMode::Transport => Err(PaymentRailError::Transport(
                "connection reset".to_string(),
            )),
        }
    }

    async fn find_payment(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<String>, PaymentRailError> {
        Ok(self.executed.lock().unwrap().get(idempotency_key).cloned())
    }
}

#[allow(dead_code)]
pub async fn create_supplier(state: &CtxState, payout_address: Option<&str>) -> SupplierEntity {
    state
        .db
        .suppliers
        .create(
            SupplierCreate {
                name: Name().fake(),
                email: None,
                payout_address: payout_address.map(|a| a.to_string()),
            },
            state.supplier_payout_threshold,
        )
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn create_package(
    state: &CtxState,
    supplier: &SupplierEntity,
    price: &str,
) -> DataPackageEntity {
    state
        .db
        .data_packages
        .create(DataPackageCreate {
            supplier: supplier.id.clone(),
            name: format!("{} feed", Name().fake::<String>()),
            category: "financial".to_string(),
            price_per_query: price.parse().unwrap(),
            endpoint_url: None,
        })
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn create_reviewer(state: &CtxState, payout_address: Option<&str>) -> ReviewerEntity {
    state
        .db
        .reviewers
        .create(
            ReviewerCreate {
                name: Name().fake(),
                email: None,
                payout_address: payout_address.map(|a| a.to_string()),
                specializations: vec!["financial".to_string()],
            },
            state.reviewer_payout_threshold,
        )
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn create_task(
    state: &CtxState,
    package: &DataPackageEntity,
    required_reviews: u32,
    reward_pool: &str,
) -> ReviewTaskEntity {
    create_task_expiring(state, package, required_reviews, reward_pool, 72).await
}

#[allow(dead_code)]
pub async fn create_task_expiring(
    state: &CtxState,
    package: &DataPackageEntity,
    required_reviews: u32,
    reward_pool: &str,
    expires_in_hours: i64,
) -> ReviewTaskEntity {
    state
        .db
        .review_tasks
        .create(ReviewTaskCreate {
            package: package.id.clone(),
            task_type: "quality_check".to_string(),
            required_reviews,
            reward_pool: reward_pool.parse::<Amount>().unwrap(),
            expires_at: Utc::now() + chrono::Duration::hours(expires_in_hours),
            reference_query: None,
        })
        .await
        .unwrap()
}

/// Supplier, package and an open task in one go.
#[allow(dead_code)]
pub async fn create_open_task(
    state: &CtxState,
    required_reviews: u32,
    reward_pool: &str,
) -> (SupplierEntity, DataPackageEntity, ReviewTaskEntity) {
    let supplier = create_supplier(state, Some("0xsupplier")).await;
    let package = create_package(state, &supplier, "0.10").await;
    let task = create_task(state, &package, required_reviews, reward_pool).await;
    (supplier, package, task)
}

#[allow(dead_code)]
pub fn token(state: &CtxState, role: CallerRole, subject: &str) -> String {
    state.jwt.create(subject, role).unwrap()
}

#[allow(dead_code)]
pub fn reviewer_token(state: &CtxState, reviewer: &ReviewerEntity) -> String {
    token(state, CallerRole::Reviewer, &reviewer.id.id.to_raw())
}

#[allow(dead_code)]
pub fn admin_token(state: &CtxState) -> String {
    token(state, CallerRole::Admin, "ops")
}

#[allow(dead_code)]
pub fn submission_body(overall_rating: u8) -> serde_json::Value {
    json!({
        "quality_score": 8,
        "timeliness_score": 7,
        "schema_compliance_score": 9,
        "overall_rating": overall_rating,
        "findings": "Fields match the published schema, two stale rows",
        "evidence": { "sampled_rows": 50 }
    })
}

#[allow(dead_code)]
pub async fn submit_review(
    server: &TestServer,
    token: &str,
    task: &ReviewTaskEntity,
    overall_rating: u8,
) -> TestResponse {
    server
        .post(&format!(
            "/api/review_tasks/{}/submissions",
            task.id.id.to_raw()
        ))
        .add_header("Authorization", format!("Bearer {token}"))
        .json(&submission_body(overall_rating))
        .await
}

#[allow(dead_code)]
pub async fn credit(state: &CtxState, key: &AccountKey, amount: &str) -> Amount {
    LedgerService::new(&state.db.balances)
        .credit(key, amount.parse().unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn run_settlement(state: &CtxState) -> SettlementRunEntity {
    SettlementService::new(
        &state.db.client,
        &state.db.balances,
        &state.db.payouts,
        &state.db.settlement_runs,
        &state.db.reviewers,
        &state.db.suppliers,
        state.payment_rail.as_ref(),
        &state.settlement,
    )
    .run()
    .await
    .unwrap()
}
