use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::entities::amount::Amount;
use crate::entities::balance::{AccountKey, AccountKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PayoutAttemptStatus {
    Pending,
    Completed,
    Failed,
}

/// Pending-settlement marker written before the rail is called. Its record key
/// is the idempotency key handed to the rail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAttemptEntity {
    pub id: Thing,
    pub account: Thing,
    pub kind: AccountKind,
    pub account_id: String,
    pub amount: Amount,
    pub destination: String,
    pub status: PayoutAttemptStatus,
    pub tx_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PayoutAttemptEntity {
    pub fn idempotency_key(&self) -> String {
        self.id.id.to_raw()
    }

    pub fn account_key(&self) -> AccountKey {
        AccountKey::new(self.kind, self.account_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRecordEntity {
    pub id: Thing,
    pub tx_ref: String,
    pub destination: String,
    pub amount: Amount,
    pub kind: AccountKind,
    pub account_id: String,
    pub attempt: Thing,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SettlementStatus {
    Paid,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettlement {
    pub kind: AccountKind,
    pub account_id: String,
    pub status: SettlementStatus,
    pub amount: Amount,
    pub tx_ref: Option<String>,
    pub reason: Option<String>,
}

impl AccountSettlement {
    pub fn paid(key: &AccountKey, amount: Amount, tx_ref: String) -> Self {
        Self {
            kind: key.kind,
            account_id: key.id.clone(),
            status: SettlementStatus::Paid,
            amount,
            tx_ref: Some(tx_ref),
            reason: None,
        }
    }

    pub fn skipped(key: &AccountKey, amount: Amount, reason: impl Into<String>) -> Self {
        Self {
            kind: key.kind,
            account_id: key.id.clone(),
            status: SettlementStatus::Skipped,
            amount,
            tx_ref: None,
            reason: Some(reason.into()),
        }
    }

    pub fn failed(key: &AccountKey, amount: Amount, reason: impl Into<String>) -> Self {
        Self {
            kind: key.kind,
            account_id: key.id.clone(),
            status: SettlementStatus::Failed,
            amount,
            tx_ref: None,
            reason: Some(reason.into()),
        }
    }

    pub fn account_key(&self) -> AccountKey {
        AccountKey::new(self.kind, self.account_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRunEntity {
    pub id: Thing,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub paid: u32,
    pub skipped: u32,
    pub failed: u32,
    pub total_paid: Amount,
    pub outcomes: Vec<AccountSettlement>,
}

impl SettlementRunEntity {
    pub fn outcome_for(&self, key: &AccountKey) -> Option<&AccountSettlement> {
        self.outcomes
            .iter()
            .find(|o| o.kind == key.kind && o.account_id == key.id)
    }
}

#[derive(Debug, Clone)]
pub struct SettlementRunCreate {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<AccountSettlement>,
}

impl SettlementRunCreate {
    pub fn count(&self, status: SettlementStatus) -> u32 {
        self.outcomes.iter().filter(|o| o.status == status).count() as u32
    }

    pub fn total_paid(&self) -> Amount {
        self.outcomes
            .iter()
            .filter(|o| o.status == SettlementStatus::Paid)
            .map(|o| o.amount)
            .sum()
    }
}
