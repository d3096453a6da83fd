pub mod aggregation;
pub mod audit;
pub mod budget;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod hidden;
pub mod normalize;
pub mod pricing;
pub mod scoring;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use aggregation::{aggregate_providers, ProviderQuote, ProviderView};
pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use budget::{compute_impact, project_impact, BudgetDecision, OverBudgetPolicy};
pub use dispatcher::{DispatchSummary, FavoritesDispatcher};
pub use domain::budget::{BudgetCategory, BudgetImpact, SpendEntry, SpendStatus};
pub use domain::favorite::{Favorite, FavoriteId, FavoriteSupplier};
pub use domain::provider::{ProviderAggregate, ProviderId, ProviderStatus};
pub use domain::quote::{QuoteEvent, QuoteId, QuoteResponse, QuoteStatus};
pub use domain::request::{ProviderRequest, RequestId, RequestStatus};
pub use errors::{DomainError, RemoteOperationError, ValidationError, WorkflowError};
pub use hidden::{HiddenProviderStore, HiddenProviders, InMemoryHiddenProviderStore};
pub use normalize::normalize_provider_name;
pub use pricing::{derive_price, DerivedPrice, PriceSource};
pub use scoring::{ComparisonSet, QuoteScorer, ScoredQuote, ScoringRules};
pub use store::{InMemoryQuoteStore, QuoteStore};
pub use workflow::{AcceptanceWorkflow, CategoryScope, Confirmation};
