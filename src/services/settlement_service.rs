use std::time::Duration;

use chrono::Utc;
use futures::{stream, StreamExt};
use surrealdb::sql::Thing;
use tokio::time::timeout;

use crate::database::client::Db;
use crate::database::surrdb_utils::{check_transaction_custom_error, with_conflict_retry};
use crate::database::table_names::{REVIEWER_TABLE_NAME, SUPPLIER_TABLE_NAME};
use crate::entities::amount::Amount;
use crate::entities::balance::{AccountKey, AccountKind};
use crate::entities::payout::{
    AccountSettlement, PayoutAttemptEntity, SettlementRunCreate, SettlementRunEntity,
    SettlementStatus,
};
use crate::interfaces::payment_rail::{PaymentRailError, PaymentRailInterface, PaymentRequest};
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::interfaces::repositories::payout_ifce::{
    PayoutRepositoryInterface, SettlementRunRepositoryInterface,
};
use crate::interfaces::repositories::reviewer_ifce::ReviewerRepositoryInterface;
use crate::interfaces::repositories::supplier_ifce::SupplierRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

pub const REASON_LOCKED: &str = "settlement already in progress";
pub const REASON_NO_ADDRESS: &str = "no payout address";
pub const REASON_BELOW_THRESHOLD: &str = "below payout threshold";
pub const REASON_TREASURY: &str = "treasury accounts are not paid out";
pub const REASON_TIMEOUT: &str = "payment timed out, outcome unknown";

#[derive(Debug, Clone)]
pub struct SettlementSettings {
    pub payment_timeout: Duration,
    pub lock_secs: u64,
    pub concurrency: usize,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_secs(20),
            lock_secs: 120,
            concurrency: 4,
        }
    }
}

pub struct SettlementService<'a, B, Y, W, R, U>
where
    B: BalanceRepositoryInterface + Send + Sync,
    Y: PayoutRepositoryInterface + Send + Sync,
    W: SettlementRunRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
    U: SupplierRepositoryInterface + Send + Sync,
{
    db: &'a Db,
    balances: &'a B,
    payouts: &'a Y,
    runs: &'a W,
    reviewers: &'a R,
    suppliers: &'a U,
    rail: &'a (dyn PaymentRailInterface + Send + Sync),
    settings: &'a SettlementSettings,
}

impl<'a, B, Y, W, R, U> SettlementService<'a, B, Y, W, R, U>
where
    B: BalanceRepositoryInterface + Send + Sync,
    Y: PayoutRepositoryInterface + Send + Sync,
    W: SettlementRunRepositoryInterface + Send + Sync,
    R: ReviewerRepositoryInterface + Send + Sync,
    U: SupplierRepositoryInterface + Send + Sync,
{
    pub fn new(
        db: &'a Db,
        balances: &'a B,
        payouts: &'a Y,
        runs: &'a W,
        reviewers: &'a R,
        suppliers: &'a U,
        rail: &'a (dyn PaymentRailInterface + Send + Sync),
        settings: &'a SettlementSettings,
    ) -> Self {
        Self {
            db,
            balances,
            payouts,
            runs,
            reviewers,
            suppliers,
            rail,
            settings,
        }
    }

    /// One settlement pass over every eligible account and every account with an
    /// unresolved payout. Per-account failures end up in the summary, never in `Err`.
    pub async fn run(&self) -> AppResult<SettlementRunEntity> {
        let started_at = Utc::now();
        let mut keys = self.balances.list_payout_eligible().await?;
        for key in self.payouts.list_pending_accounts().await? {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let outcomes: Vec<AccountSettlement> = stream::iter(keys)
            .map(|key| async move { self.settle_account(&key).await })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let summary = SettlementRunCreate {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        let saved = self.runs.save(&summary).await?;
        tracing::info!(
            run = %saved.id,
            paid = saved.paid,
            skipped = saved.skipped,
            failed = saved.failed,
            total_paid = %saved.total_paid,
            "settlement run finished"
        );
        Ok(saved)
    }

    async fn settle_account(&self, key: &AccountKey) -> AccountSettlement {
        let outcome = if key.kind == AccountKind::TreasuryPool {
            AccountSettlement::skipped(key, Amount::ZERO, REASON_TREASURY)
        } else {
            match self
                .balances
                .try_lock_for_settlement(key, self.settings.lock_secs)
                .await
            {
                Err(err) => AccountSettlement::failed(key, Amount::ZERO, err.to_string()),
                Ok(None) => AccountSettlement::skipped(key, Amount::ZERO, REASON_LOCKED),
                Ok(Some(_)) => {
                    let outcome = self
                        .settle_locked(key)
                        .await
                        .unwrap_or_else(|err| AccountSettlement::failed(key, Amount::ZERO, err.to_string()));
                    // a finalized payout clears the lock in its own transaction
                    if outcome.status != SettlementStatus::Paid {
                        if let Err(err) = self.balances.release_settlement_lock(key).await {
                            tracing::warn!(account = %key, "settlement lock not released: {err}");
                        }
                    }
                    outcome
                }
            }
        };

        match outcome.status {
            SettlementStatus::Paid => tracing::info!(
                account = %key,
                amount = %outcome.amount,
                tx_ref = outcome.tx_ref.as_deref().unwrap_or_default(),
                "account settled"
            ),
            SettlementStatus::Skipped => tracing::info!(
                account = %key,
                amount = %outcome.amount,
                reason = outcome.reason.as_deref().unwrap_or_default(),
                "account skipped"
            ),
            SettlementStatus::Failed => tracing::warn!(
                account = %key,
                amount = %outcome.amount,
                reason = outcome.reason.as_deref().unwrap_or_default(),
                "account settlement failed"
            ),
        }
        outcome
    }

    async fn settle_locked(&self, key: &AccountKey) -> AppResult<AccountSettlement> {
        if let Some(attempt) = self.payouts.list_pending_attempts(key).await?.into_iter().next() {
            return self.resume(key, attempt).await;
        }

        let balance = self
            .balances
            .get(key)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: key.to_string(),
            })?;
        if !balance.is_payout_eligible() {
            return Ok(AccountSettlement::skipped(
                key,
                balance.balance,
                REASON_BELOW_THRESHOLD,
            ));
        }
        let Some(destination) = self.payout_address(key).await? else {
            return Ok(AccountSettlement::skipped(key, balance.balance, REASON_NO_ADDRESS));
        };

        let attempt = self
            .payouts
            .create_attempt(key, balance.balance, &destination)
            .await?;
        self.dispatch(key, &attempt).await
    }

    /// Finishes an attempt left pending by an earlier run. A transfer the rail does not
    /// know yet is sent again under the same idempotency key, never under a new one.
    async fn resume(
        &self,
        key: &AccountKey,
        attempt: PayoutAttemptEntity,
    ) -> AppResult<AccountSettlement> {
        let lookup = timeout(
            self.settings.payment_timeout,
            self.rail.find_payment(&attempt.idempotency_key()),
        )
        .await
        .unwrap_or_else(|_| Err(PaymentRailError::Transport("lookup timed out".to_string())));

        match lookup {
            Ok(Some(tx_ref)) => {
                self.finalize(&attempt, &tx_ref).await?;
                tracing::info!(account = %key, attempt = %attempt.id, "pending payout reconciled");
                Ok(AccountSettlement::paid(key, attempt.amount, tx_ref))
            }
            Ok(None) => {
                tracing::info!(account = %key, attempt = %attempt.id, "pending payout unknown to rail, resending");
                self.dispatch(key, &attempt).await
            }
            Err(err) => Ok(AccountSettlement::failed(
                key,
                attempt.amount,
                format!("pending payout lookup failed: {err}"),
            )),
        }
    }

    async fn dispatch(
        &self,
        key: &AccountKey,
        attempt: &PayoutAttemptEntity,
    ) -> AppResult<AccountSettlement> {
        let request = PaymentRequest {
            idempotency_key: attempt.idempotency_key(),
            destination: attempt.destination.clone(),
            amount: attempt.amount,
        };

        match timeout(self.settings.payment_timeout, self.rail.send_payment(&request)).await {
            Ok(Ok(tx_ref)) => {
                self.finalize(attempt, &tx_ref).await?;
                Ok(AccountSettlement::paid(key, attempt.amount, tx_ref))
            }
            Ok(Err(PaymentRailError::Rejected(reason))) => {
                self.payouts.mark_attempt_failed(&attempt.id, &reason).await?;
                Ok(AccountSettlement::failed(
                    key,
                    attempt.amount,
                    format!("payment rejected: {reason}"),
                ))
            }
            // the transfer may have happened, the attempt stays pending for the next run
            Ok(Err(err @ PaymentRailError::Transport(_))) => Ok(AccountSettlement::failed(
                key,
                attempt.amount,
                err.to_string(),
            )),
            Err(_) => Ok(AccountSettlement::failed(key, attempt.amount, REASON_TIMEOUT)),
        }
    }

    async fn finalize(&self, attempt: &PayoutAttemptEntity, tx_ref: &str) -> AppResult<()> {
        let account = attempt.account_key();
        let account = &account;
        with_conflict_retry(|| async move {
            let mut query = self.db.query("BEGIN TRANSACTION");
            query = self.payouts.build_finalize_query(query, attempt, tx_ref);
            query = self
                .balances
                .build_settle_debit_query(query, account, attempt.amount);
            let mut res = query.query("COMMIT TRANSACTION").await?;
            check_transaction_custom_error(&mut res)
        })
        .await
    }

    async fn payout_address(&self, key: &AccountKey) -> AppResult<Option<String>> {
        let address = match key.kind {
            AccountKind::Reviewer => self
                .reviewers
                .get(&Thing::from((REVIEWER_TABLE_NAME, key.id.as_str())))
                .await?
                .and_then(|r| r.payout_address),
            AccountKind::Supplier => self
                .suppliers
                .get(&Thing::from((SUPPLIER_TABLE_NAME, key.id.as_str())))
                .await?
                .and_then(|s| s.payout_address),
            AccountKind::TreasuryPool => None,
        };
        Ok(address.filter(|a| !a.trim().is_empty()))
    }
}
