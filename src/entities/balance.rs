use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::database::table_names::BALANCE_TABLE_NAME;
use crate::entities::amount::Amount;

pub const TREASURY_REVIEWER_POOL: &str = "reviewer_pool";
pub const TREASURY_PLATFORM: &str = "platform";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountKind {
    Supplier,
    Reviewer,
    TreasuryPool,
}

/// Ledger account identity: (account kind, owner id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub kind: AccountKind,
    pub id: String,
}

impl AccountKey {
    pub fn new(kind: AccountKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn reviewer(id: impl Into<String>) -> Self {
        Self::new(AccountKind::Reviewer, id)
    }

    pub fn supplier(id: impl Into<String>) -> Self {
        Self::new(AccountKind::Supplier, id)
    }

    pub fn treasury(id: impl Into<String>) -> Self {
        Self::new(AccountKind::TreasuryPool, id)
    }

    pub fn record_id(&self) -> Thing {
        Thing::from((BALANCE_TABLE_NAME, format!("{}_{}", self.kind, self.id).as_str()))
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntity {
    pub id: Thing,
    pub kind: AccountKind,
    pub account_id: String,
    pub balance: Amount,
    pub payout_threshold: Amount,
    #[serde(default)]
    pub settlement_lock: Option<DateTime<Utc>>,
    pub r_updated: Option<DateTime<Utc>>,
}

impl BalanceEntity {
    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.kind, self.account_id.clone())
    }

    /// Treasury accounts never pay themselves out.
    pub fn is_payout_eligible(&self) -> bool {
        self.kind != AccountKind::TreasuryPool
            && self.balance.is_positive()
            && self.balance >= self.payout_threshold
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceView {
    pub kind: AccountKind,
    pub account_id: String,
    pub balance: Amount,
    pub payout_threshold: Amount,
}

impl From<BalanceEntity> for BalanceView {
    fn from(value: BalanceEntity) -> Self {
        Self {
            kind: value.kind,
            account_id: value.account_id,
            balance: value.balance,
            payout_threshold: value.payout_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(kind: AccountKind, balance: i64, threshold: i64) -> BalanceEntity {
        let key = AccountKey::new(kind, "abc");
        BalanceEntity {
            id: key.record_id(),
            kind,
            account_id: key.id,
            balance: Amount::from_micros(balance),
            payout_threshold: Amount::from_micros(threshold),
            settlement_lock: None,
            r_updated: None,
        }
    }

    #[test]
    fn record_id_joins_kind_and_owner() {
        let key = AccountKey::treasury(TREASURY_REVIEWER_POOL);
        assert_eq!(key.record_id().id.to_raw(), "treasury_pool_reviewer_pool");
        assert_eq!(key.to_string(), "treasury_pool/reviewer_pool");
    }

    #[test]
    fn eligibility_requires_threshold_and_positive_balance() {
        assert!(account(AccountKind::Supplier, 26_000_000, 25_000_000).is_payout_eligible());
        assert!(account(AccountKind::Reviewer, 5_000_000, 5_000_000).is_payout_eligible());
        assert!(!account(AccountKind::Reviewer, 4_999_999, 5_000_000).is_payout_eligible());
        assert!(!account(AccountKind::Reviewer, 0, 0).is_payout_eligible());
        assert!(!account(AccountKind::TreasuryPool, 90_000_000, 0).is_payout_eligible());
    }
}
