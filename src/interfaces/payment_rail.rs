use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::amount::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Same key for every retry of one payout; the rail executes it at most once.
    pub idempotency_key: String,
    pub destination: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRailError {
    /// The rail refused the payment, nothing was transferred.
    Rejected(String),
    /// Outcome unknown, the transfer may or may not have happened.
    Transport(String),
}

impl fmt::Display for PaymentRailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentRailError::Rejected(reason) => write!(f, "payment rejected: {reason}"),
            PaymentRailError::Transport(reason) => write!(f, "payment transport error: {reason}"),
        }
    }
}

impl std::error::Error for PaymentRailError {}

#[async_trait]
pub trait PaymentRailInterface {
    /// Returns the rail's transaction reference.
    async fn send_payment(&self, request: &PaymentRequest) -> Result<String, PaymentRailError>;

    /// Transaction reference of a payment previously sent with `idempotency_key`.
    async fn find_payment(&self, idempotency_key: &str)
        -> Result<Option<String>, PaymentRailError>;
}
