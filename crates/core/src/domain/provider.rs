use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteResponse;
use crate::domain::request::ProviderRequest;

/// Normalized provider name; the grouping key shared by requests and quotes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    #[default]
    Pending,
    Quoted,
    Accepted,
}

/// Derived view of one supplier. Rebuilt from the raw lists on every load, never patched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAggregate {
    pub id: ProviderId,
    pub name: String,
    pub email: Option<String>,
    pub requests: Vec<ProviderRequest>,
    pub quotes: Vec<QuoteResponse>,
    pub status: ProviderStatus,
}

/// Keys for the single "cancel all requests for this provider" call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationTarget {
    /// Only requests of this category are cancelled.
    #[serde(default)]
    pub category: String,
    pub supplier_id: Option<String>,
    pub supplier_email: Option<String>,
}

impl CancellationTarget {
    pub fn is_empty(&self) -> bool {
        self.supplier_id.is_none() && self.supplier_email.is_none()
    }
}

impl ProviderAggregate {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.quotes.is_empty()
    }

    pub fn accepted_quotes(&self) -> impl Iterator<Item = &QuoteResponse> {
        self.quotes.iter().filter(|quote| quote.is_accepted())
    }

    pub fn cancellation_target(&self, category: impl Into<String>) -> CancellationTarget {
        CancellationTarget {
            category: category.into(),
            supplier_id: self
                .requests
                .first()
                .map(|request| request.id.0.clone())
                .filter(|id| !id.trim().is_empty()),
            supplier_email: self.email.clone(),
        }
    }
}
