use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Received,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Received,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteEvent {
    Accept,
    Reject,
    Restore,
    /// The whole provider is being removed; the only way out of `Accepted`.
    ProviderRemoved,
}

/// Returns the status reached by applying `event`, or `None` when the move is not allowed.
///
/// Re-applying an event to a quote already in its target state is allowed so that retries of
/// the same user action stay idempotent.
pub fn next_status(current: QuoteStatus, event: QuoteEvent) -> Option<QuoteStatus> {
    use QuoteEvent::{Accept, ProviderRemoved, Reject, Restore};
    use QuoteStatus::{Accepted, Received, Rejected};

    match (current, event) {
        (Received, Accept) | (Accepted, Accept) => Some(Accepted),
        (Received, Reject) | (Rejected, Reject) => Some(Rejected),
        (Rejected, Restore) | (Received, Restore) => Some(Received),
        (_, ProviderRemoved) => Some(Rejected),
        _ => None,
    }
}

/// One inbound offer. Joined to its provider by normalized `supplier_name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(default)]
    pub id: QuoteId,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub supplier_name: String,
    #[serde(default)]
    pub supplier_email: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub supplier_phone: Option<String>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub confidence: Option<u8>,
    #[serde(default)]
    pub services_included: Vec<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub cancellation_policy: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub status: QuoteStatus,
}

impl QuoteResponse {
    pub fn can_apply(&self, event: QuoteEvent) -> bool {
        next_status(self.status, event).is_some()
    }

    pub fn apply(&mut self, event: QuoteEvent) -> Result<(), DomainError> {
        match next_status(self.status, event) {
            Some(next) => {
                self.status = next;
                Ok(())
            }
            None => Err(DomainError::InvalidQuoteTransition { from: self.status, event }),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == QuoteStatus::Accepted
    }
}
