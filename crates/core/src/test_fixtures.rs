use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::audit::InMemoryAuditSink;
use crate::domain::quote::{QuoteId, QuoteResponse, QuoteStatus};
use crate::domain::request::{ProviderRequest, RequestId, RequestStatus};
use crate::hidden::InMemoryHiddenProviderStore;
use crate::store::InMemoryQuoteStore;
use crate::workflow::{AcceptanceWorkflow, CategoryScope};

pub const CATEGORY: &str = "fotografia";

pub fn request(id: &str, name: &str, email: Option<&str>) -> ProviderRequest {
    ProviderRequest {
        id: RequestId(id.to_string()),
        name: name.to_string(),
        email: email.map(str::to_string),
        status: RequestStatus::Quoted,
        sent_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).single().unwrap_or_else(Utc::now),
    }
}

pub fn quote(id: &str, supplier: &str, total: Option<i64>) -> QuoteResponse {
    QuoteResponse {
        id: QuoteId(id.to_string()),
        supplier_name: supplier.to_string(),
        supplier_email: None,
        supplier_id: None,
        supplier_phone: None,
        total_price: total.map(|value| Decimal::new(value, 0)),
        amount: None,
        price: None,
        description: None,
        confidence: None,
        services_included: Vec::new(),
        payment_terms: None,
        cancellation_policy: None,
        delivery_time: None,
        received_at: Utc.with_ymd_and_hms(2026, 2, 14, 9, 0, 0).single().unwrap_or_else(Utc::now),
        status: QuoteStatus::Received,
    }
}

pub type TestWorkflow =
    AcceptanceWorkflow<InMemoryQuoteStore, InMemoryHiddenProviderStore, InMemoryAuditSink>;

pub struct Harness {
    pub store: Arc<InMemoryQuoteStore>,
    pub hidden_store: Arc<InMemoryHiddenProviderStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub workflow: TestWorkflow,
}

pub fn harness(store: InMemoryQuoteStore) -> Harness {
    harness_with_hidden(store, InMemoryHiddenProviderStore::default())
}

pub fn harness_with_hidden(
    store: InMemoryQuoteStore,
    hidden_store: InMemoryHiddenProviderStore,
) -> Harness {
    let store = Arc::new(store);
    let hidden_store = Arc::new(hidden_store);
    let audit = Arc::new(InMemoryAuditSink::default());
    let workflow = AcceptanceWorkflow::new(
        Arc::clone(&store),
        Arc::clone(&hidden_store),
        Arc::clone(&audit),
        CategoryScope::new(CATEGORY, "Fotografía"),
    )
    .with_correlation_id("corr-test");
    Harness { store, hidden_store, audit, workflow }
}
