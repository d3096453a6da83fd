//! Accept, reject, restore, and remove providers for one category.
//!
//! Every action talks to the quote store sequentially and is safe to retry. Nothing is atomic
//! across sub-steps: follow-up failures are recorded in the returned outcome instead of rolling
//! back earlier steps.

mod acceptance;
mod removal;
pub mod report;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregation::{aggregate_providers, ProviderView};
use crate::audit::{AuditEvent, AuditKind, AuditOutcome, AuditSink};
use crate::budget::{project_impact, BudgetDecision, OverBudgetPolicy};
use crate::domain::quote::QuoteResponse;
use crate::errors::{ValidationError, WorkflowError};
use crate::hidden::{hidden_providers_key, HiddenProviderStore, HiddenProviders};
use crate::store::QuoteStore;

pub use report::{
    AcceptanceOutcome, BudgetCheck, BudgetUpdate, DeleteOutcome, DeleteProviderReport,
    StatusChangeOutcome, StepOutcome,
};

pub const DEFAULT_ACTOR: &str = "planner";

/// Category the user is working in. `category` is the store key, `label` the display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScope {
    pub category: String,
    pub label: String,
}

impl CategoryScope {
    pub fn new(category: impl Into<String>, label: impl Into<String>) -> Self {
        Self { category: category.into(), label: label.into() }
    }

    /// Uses the category key as its own label.
    pub fn from_category(category: impl Into<String>) -> Self {
        let category = category.into();
        Self { label: category.clone(), category }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }

    pub fn require(self, action: &'static str) -> Result<(), ValidationError> {
        match self {
            Self::Confirmed => Ok(()),
            Self::Declined => Err(ValidationError::ConfirmationRequired { action }),
        }
    }
}

pub struct AcceptanceWorkflow<S, H, A> {
    store: Arc<S>,
    hidden_store: Arc<H>,
    audit: Arc<A>,
    scope: CategoryScope,
    hidden: HiddenProviders,
    budget_policy: OverBudgetPolicy,
    actor: String,
    correlation_id: String,
}

impl<S, H, A> AcceptanceWorkflow<S, H, A>
where
    S: QuoteStore,
    H: HiddenProviderStore,
    A: AuditSink,
{
    pub fn new(store: Arc<S>, hidden_store: Arc<H>, audit: Arc<A>, scope: CategoryScope) -> Self {
        Self {
            store,
            hidden_store,
            audit,
            scope,
            hidden: HiddenProviders::default(),
            budget_policy: OverBudgetPolicy::default(),
            actor: DEFAULT_ACTOR.to_string(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_budget_policy(mut self, policy: OverBudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn scope(&self) -> &CategoryScope {
        &self.scope
    }

    pub fn hidden(&self) -> &HiddenProviders {
        &self.hidden
    }

    /// Loads the persisted hidden set. An unreadable set is treated as empty.
    pub async fn load_hidden(&mut self) -> &HiddenProviders {
        let key = hidden_providers_key(&self.scope.category);
        match self.hidden_store.load(&key).await {
            Ok(ids) => self.hidden = HiddenProviders::from_ids(ids),
            Err(error) => {
                warn!(
                    event_name = "workflow.hidden.load_failed",
                    category = %self.scope.category,
                    error = %error,
                    "hidden providers could not be loaded; showing every provider"
                );
                self.hidden = HiddenProviders::default();
            }
        }
        &self.hidden
    }

    /// Rebuilds the provider view from fresh store snapshots.
    pub async fn refresh(&self) -> Result<ProviderView, WorkflowError> {
        let requests = self.store.list_requests(&self.scope.category).await?;
        let responses = self.store.list_responses(&self.scope.category).await?;
        let aggregates = aggregate_providers(&requests, &responses);
        let view = ProviderView::build(self.scope.category.clone(), aggregates, self.hidden.ids());
        debug!(
            event_name = "workflow.view.refreshed",
            category = %self.scope.category,
            providers = view.providers.len(),
            hidden = view.hidden.len(),
            "provider view rebuilt"
        );
        Ok(view)
    }

    /// Projects the budget impact of `candidate` and applies the over-budget policy.
    pub async fn check_budget(
        &self,
        candidate: &QuoteResponse,
        total_budget: Decimal,
        confirmation: Confirmation,
    ) -> Result<BudgetCheck, WorkflowError> {
        let view = self.refresh().await?;
        let impact = project_impact(&view.providers, candidate, total_budget);
        let decision = self.budget_policy.decide(&impact);

        match decision {
            BudgetDecision::Blocked => {
                return Err(ValidationError::OverBudget { remaining: impact.remaining_budget }.into())
            }
            BudgetDecision::RequiresConfirmation => {
                confirmation.require("accepting an over-budget quote")?;
            }
            BudgetDecision::ProceedWithWarning => warn!(
                event_name = "workflow.budget.over",
                category = %self.scope.category,
                quote_id = %candidate.id,
                remaining = %impact.remaining_budget,
                "quote takes the category over budget"
            ),
            BudgetDecision::Proceed => {}
        }

        Ok(BudgetCheck { impact, decision })
    }

    /// View after a successful action. A failed reload does not undo the action.
    async fn refreshed_view(&self) -> Option<ProviderView> {
        match self.refresh().await {
            Ok(view) => Some(view),
            Err(error) => {
                warn!(
                    event_name = "workflow.view.refresh_failed",
                    category = %self.scope.category,
                    error = %error,
                    "provider view could not be reloaded"
                );
                None
            }
        }
    }

    async fn persist_hidden(&self) {
        let key = hidden_providers_key(&self.scope.category);
        if let Err(error) = self.hidden_store.save(&key, self.hidden.ids()).await {
            warn!(
                event_name = "workflow.hidden.save_failed",
                category = %self.scope.category,
                error = %error,
                "hidden providers kept for this session only"
            );
        }
    }

    fn audit_event(
        &self,
        event_type: &str,
        kind: AuditKind,
        subject_id: Option<String>,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent::new(
            self.scope.category.clone(),
            subject_id,
            self.correlation_id.clone(),
            event_type,
            kind,
            self.actor.clone(),
            outcome,
        )
    }
}
