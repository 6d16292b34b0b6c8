use crate::entities::amount::Amount;
use crate::entities::balance::{AccountKey, BalanceView};
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

pub struct LedgerService<'a, B>
where
    B: BalanceRepositoryInterface + Send + Sync,
{
    balances: &'a B,
}

impl<'a, B> LedgerService<'a, B>
where
    B: BalanceRepositoryInterface + Send + Sync,
{
    pub fn new(balances: &'a B) -> Self {
        Self { balances }
    }

    /// Standalone credit. Consensus payouts and revenue shares compose
    /// `build_credit_query` into their own transactions instead.
    pub async fn credit(&self, key: &AccountKey, amount: Amount) -> AppResult<Amount> {
        if !amount.is_positive() {
            return Err(AppError::Validation {
                description: format!("credit amount must be positive, got {amount}"),
            });
        }
        let balance = self.balances.credit(key, amount).await?;
        tracing::debug!(account = %key, %amount, %balance, "ledger credit");
        Ok(balance)
    }

    pub async fn get(&self, key: &AccountKey) -> AppResult<BalanceView> {
        self.balances
            .get(key)
            .await?
            .map(BalanceView::from)
            .ok_or(AppError::EntityFailIdNotFound {
                ident: key.to_string(),
            })
    }

    pub async fn set_threshold(&self, key: &AccountKey, threshold: Amount) -> AppResult<BalanceView> {
        if threshold.is_negative() {
            return Err(AppError::Validation {
                description: "payout threshold can not be negative".to_string(),
            });
        }
        let updated = self.balances.set_threshold(key, threshold).await?;
        Ok(updated.into())
    }

    /// Removes a settled amount outside a payout transaction, keeping late credits.
    /// Settlement finalizes through `build_settle_debit_query` instead.
    pub async fn zero_if_unclaimed(&self, key: &AccountKey, settled: Amount) -> AppResult<Amount> {
        let remaining = self.balances.zero_if_unclaimed(key, settled).await?;
        tracing::debug!(account = %key, %settled, %remaining, "settled amount removed");
        Ok(remaining)
    }
}
