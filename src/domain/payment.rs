use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Expired,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        self != PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// An issued QR payload awaiting settlement, keyed by its reference.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentRequest {
    pub reference: String,
    /// Normalized recipient digits.
    pub recipient: String,
    pub amount: Decimal,
    pub payload: String,
    pub status: PaymentStatus,
    /// Unix seconds.
    pub issued_at: u64,
    /// Unix seconds.
    pub expires_at: u64,
}

impl PaymentRequest {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

impl PaymentOutcome {
    pub fn target_status(self) -> PaymentStatus {
        match self {
            PaymentOutcome::Paid => PaymentStatus::Completed,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }
}

/// A settlement notice for an issued request, as delivered by a bank webhook.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct PaymentNotification {
    pub reference: String,
    pub amount: Decimal,
    pub outcome: PaymentOutcome,
}

impl PaymentNotification {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}
