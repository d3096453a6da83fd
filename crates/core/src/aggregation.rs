//! Folds raw requests and quote responses into per-provider aggregates.
//!
//! The fold is pure: it rebuilds the whole view from the two snapshots on every call and never
//! patches a previous result, so late-arriving records cannot leave stale rows behind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::provider::{ProviderAggregate, ProviderId, ProviderStatus};
use crate::domain::quote::QuoteResponse;
use crate::domain::request::{ProviderRequest, RequestStatus};
use crate::normalize::provider_id;

/// Groups requests and quotes by normalized provider name.
///
/// Output order is the order in which each provider's first live request appears. Cancelled
/// requests are dropped before grouping and quotes whose provider was never requested are
/// skipped.
pub fn aggregate_providers(
    requests: &[ProviderRequest],
    responses: &[QuoteResponse],
) -> Vec<ProviderAggregate> {
    let mut providers: Vec<ProviderAggregate> = Vec::new();
    let mut index: HashMap<ProviderId, usize> = HashMap::new();

    for request in requests.iter().filter(|request| !request.is_cancelled()) {
        let id = provider_id(&request.name);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            providers.push(ProviderAggregate {
                id,
                name: request.name.clone(),
                email: None,
                requests: Vec::new(),
                quotes: Vec::new(),
                status: ProviderStatus::Pending,
            });
            providers.len() - 1
        });

        let provider = &mut providers[slot];
        if provider.email.is_none() {
            provider.email = request.email.clone().filter(|email| !email.trim().is_empty());
        }
        provider.requests.push(request.clone());
    }

    for quote in responses {
        let id = provider_id(&quote.supplier_name);
        match index.get(&id) {
            Some(slot) => providers[*slot].quotes.push(quote.clone()),
            None => debug!(
                event_name = "aggregation.quote.orphaned",
                quote_id = %quote.id,
                provider_id = %id,
                "skipping quote without a matching request"
            ),
        }
    }

    providers.retain(|provider| !provider.is_empty());
    for provider in &mut providers {
        provider.status = derive_status(provider);

        let accepted = provider.accepted_quotes().count();
        if accepted > 1 {
            warn!(
                event_name = "aggregation.provider.multiple_accepted",
                provider_id = %provider.id,
                accepted,
                "provider holds more than one accepted quote"
            );
        }
    }

    providers
}

fn derive_status(provider: &ProviderAggregate) -> ProviderStatus {
    if provider.quotes.iter().any(QuoteResponse::is_accepted) {
        ProviderStatus::Accepted
    } else if !provider.quotes.is_empty()
        || provider.requests.iter().any(|request| request.status == RequestStatus::Quoted)
    {
        ProviderStatus::Quoted
    } else {
        ProviderStatus::Pending
    }
}

/// Aggregates for one category after the user's hidden providers are filtered out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub category: String,
    pub providers: Vec<ProviderAggregate>,
    pub hidden: Vec<ProviderId>,
}

impl ProviderView {
    pub fn build(
        category: impl Into<String>,
        aggregates: Vec<ProviderAggregate>,
        hidden: &[ProviderId],
    ) -> Self {
        let (hidden_providers, providers): (Vec<_>, Vec<_>) =
            aggregates.into_iter().partition(|provider| hidden.contains(&provider.id));

        Self {
            category: category.into(),
            providers,
            hidden: hidden_providers.into_iter().map(|provider| provider.id).collect(),
        }
    }

    pub fn find(&self, id: &ProviderId) -> Option<&ProviderAggregate> {
        self.providers.iter().find(|provider| &provider.id == id)
    }

    /// Every visible quote annotated with the provider it belongs to.
    pub fn all_quotes(&self) -> Vec<ProviderQuote> {
        self.providers
            .iter()
            .flat_map(|provider| {
                provider.quotes.iter().map(move |quote| ProviderQuote {
                    provider_id: provider.id.clone(),
                    provider_name: provider.name.clone(),
                    provider_email: provider.email.clone(),
                    quote: quote.clone(),
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub provider_email: Option<String>,
    pub quote: QuoteResponse,
}
