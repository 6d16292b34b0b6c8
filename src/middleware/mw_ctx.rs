use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::entities::amount::Amount;
use crate::interfaces::payment_rail::PaymentRailInterface;
use crate::services::revenue_service::RevenueSplit;
use crate::services::settlement_service::SettlementSettings;
use crate::utils::jwt::JWT;

pub struct CtxState {
    pub db: Database,
    pub jwt: JWT,
    pub payment_rail: Arc<dyn PaymentRailInterface + Send + Sync>,
    pub settlement: SettlementSettings,
    pub revenue_split: RevenueSplit,
    pub reviewer_payout_threshold: Amount,
    pub supplier_payout_threshold: Amount,
    pub settlement_interval: Duration,
    pub redrive_interval: Duration,
}

impl Debug for CtxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtxState")
            .field("settlement", &self.settlement)
            .field("revenue_split", &self.revenue_split)
            .finish_non_exhaustive()
    }
}

pub fn create_ctx_state(
    db: Database,
    config: &AppConfig,
    payment_rail: Arc<dyn PaymentRailInterface + Send + Sync>,
) -> Arc<CtxState> {
    let ctx_state = CtxState {
        db,
        jwt: JWT::new(config.jwt_secret.clone(), chrono::Duration::days(1)),
        payment_rail,
        settlement: SettlementSettings {
            payment_timeout: Duration::from_secs(config.payment_timeout_secs),
            lock_secs: config.settlement_lock_secs,
            concurrency: config.settlement_concurrency,
        },
        revenue_split: config.revenue_split,
        reviewer_payout_threshold: config.reviewer_payout_threshold,
        supplier_payout_threshold: config.supplier_payout_threshold,
        settlement_interval: Duration::from_secs(config.settlement_interval_secs),
        redrive_interval: Duration::from_secs(config.consensus_redrive_interval_secs),
    };
    Arc::new(ctx_state)
}
