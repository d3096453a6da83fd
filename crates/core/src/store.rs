//! The quote store collaborator: requests, responses, service slots, and the budget.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::budget::BudgetCategory;
use crate::domain::provider::CancellationTarget;
use crate::domain::quote::{QuoteId, QuoteResponse, QuoteStatus};
use crate::domain::request::{ProviderRequest, RequestId, RequestStatus};
use crate::errors::{RemoteOperation, RemoteOperationError};
use crate::normalize::normalize_provider_name;

pub const CONTRACTED_STATUS_LABEL: &str = "contracted";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    pub cancelled: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteRequest {
    pub supplier_id: Option<String>,
    pub supplier_name: String,
    pub supplier_email: Option<String>,
    pub category: String,
    pub service: String,
    pub message: String,
    pub urgent: bool,
}

/// Provider booked into a service slot of the wedding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAssignment {
    pub supplier_id: String,
    pub supplier_name: String,
    pub supplier_email: Option<String>,
    pub supplier_phone: Option<String>,
    pub price: Decimal,
    pub notes: String,
    pub status_label: String,
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn list_requests(&self, category: &str)
        -> Result<Vec<ProviderRequest>, RemoteOperationError>;

    async fn list_responses(&self, category: &str)
        -> Result<Vec<QuoteResponse>, RemoteOperationError>;

    async fn update_quote_status(
        &self,
        quote_id: &QuoteId,
        status: QuoteStatus,
        note: Option<&str>,
    ) -> Result<QuoteResponse, RemoteOperationError>;

    async fn cancel_provider_requests(
        &self,
        target: &CancellationTarget,
    ) -> Result<CancelResult, RemoteOperationError>;

    async fn create_quote_request(
        &self,
        request: &NewQuoteRequest,
    ) -> Result<ProviderRequest, RemoteOperationError>;

    async fn assign_supplier_to_service(
        &self,
        role: &str,
        assignment: &SupplierAssignment,
    ) -> Result<(), RemoteOperationError>;

    async fn budget_categories(&self) -> Result<Vec<BudgetCategory>, RemoteOperationError>;

    async fn update_budget_category(
        &self,
        index: usize,
        amount: Decimal,
    ) -> Result<(), RemoteOperationError>;
}

/// Which calls an [`InMemoryQuoteStore`] should fail.
#[derive(Clone, Debug, Default)]
pub struct FailurePlan {
    pub status_updates: HashSet<QuoteId>,
    pub cancellations: bool,
    pub assignments: bool,
    pub budget_updates: bool,
    pub listing: bool,
    pub requests_for: HashSet<String>,
}

#[derive(Clone, Debug, Default)]
pub struct StoreCalls {
    pub status_updates: Vec<(QuoteId, QuoteStatus, Option<String>)>,
    pub cancellations: Vec<CancellationTarget>,
    pub assignments: Vec<(String, SupplierAssignment)>,
    pub budget_updates: Vec<(usize, Decimal)>,
    pub created_requests: Vec<NewQuoteRequest>,
}

#[derive(Default)]
struct MemoryState {
    requests: Vec<(String, ProviderRequest)>,
    responses: Vec<(String, QuoteResponse)>,
    budget: Vec<BudgetCategory>,
    calls: StoreCalls,
}

/// Store double used by unit tests and local experiments.
#[derive(Default)]
pub struct InMemoryQuoteStore {
    state: Mutex<MemoryState>,
    failures: FailurePlan,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(mut self, failures: FailurePlan) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_request(self, category: &str, request: ProviderRequest) -> Self {
        self.state().requests.push((category.to_string(), request));
        self
    }

    pub fn with_response(self, category: &str, response: QuoteResponse) -> Self {
        self.state().responses.push((category.to_string(), response));
        self
    }

    pub fn with_budget(self, budget: Vec<BudgetCategory>) -> Self {
        self.state().budget = budget;
        self
    }

    pub fn calls(&self) -> StoreCalls {
        self.state().calls.clone()
    }

    pub fn quote(&self, id: &QuoteId) -> Option<QuoteResponse> {
        self.state()
            .responses
            .iter()
            .find(|(_, quote)| &quote.id == id)
            .map(|(_, quote)| quote.clone())
    }

    pub fn budget(&self) -> Vec<BudgetCategory> {
        self.state().budget.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_listing(&self, operation: RemoteOperation) -> Result<(), RemoteOperationError> {
        if self.failures.listing {
            return Err(RemoteOperationError::failed(operation, "listing unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn list_requests(
        &self,
        category: &str,
    ) -> Result<Vec<ProviderRequest>, RemoteOperationError> {
        self.check_listing(RemoteOperation::ListRequests)?;
        Ok(self
            .state()
            .requests
            .iter()
            .filter(|(owner, _)| owner == category)
            .map(|(_, request)| request.clone())
            .collect())
    }

    async fn list_responses(
        &self,
        category: &str,
    ) -> Result<Vec<QuoteResponse>, RemoteOperationError> {
        self.check_listing(RemoteOperation::ListResponses)?;
        Ok(self
            .state()
            .responses
            .iter()
            .filter(|(owner, _)| owner == category)
            .map(|(_, quote)| quote.clone())
            .collect())
    }

    async fn update_quote_status(
        &self,
        quote_id: &QuoteId,
        status: QuoteStatus,
        note: Option<&str>,
    ) -> Result<QuoteResponse, RemoteOperationError> {
        let mut state = self.state();
        state.calls.status_updates.push((quote_id.clone(), status, note.map(str::to_string)));

        if self.failures.status_updates.contains(quote_id) {
            return Err(RemoteOperationError::failed(
                RemoteOperation::UpdateQuoteStatus,
                format!("status update for `{quote_id}` was refused"),
            ));
        }

        let quote = state
            .responses
            .iter_mut()
            .map(|(_, quote)| quote)
            .find(|quote| &quote.id == quote_id)
            .ok_or_else(|| {
                RemoteOperationError::not_found(RemoteOperation::UpdateQuoteStatus, quote_id.0.clone())
            })?;
        quote.status = status;
        Ok(quote.clone())
    }

    async fn cancel_provider_requests(
        &self,
        target: &CancellationTarget,
    ) -> Result<CancelResult, RemoteOperationError> {
        let mut state = self.state();
        state.calls.cancellations.push(target.clone());

        if self.failures.cancellations {
            return Err(RemoteOperationError::failed(
                RemoteOperation::CancelProviderRequests,
                "cancellation service unavailable",
            ));
        }

        let provider_key = target.supplier_id.as_ref().and_then(|id| {
            state
                .requests
                .iter()
                .find(|(category, request)| *category == target.category && &request.id.0 == id)
                .map(|(_, request)| normalize_provider_name(&request.name))
        });

        let mut cancelled = 0;
        for (category, request) in &mut state.requests {
            if *category != target.category {
                continue;
            }
            let same_provider =
                provider_key.as_deref() == Some(normalize_provider_name(&request.name).as_str());
            let same_email = target.supplier_email.is_some() && request.email == target.supplier_email;
            if (same_provider || same_email) && !request.is_cancelled() {
                request.status = RequestStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(CancelResult { cancelled })
    }

    async fn create_quote_request(
        &self,
        request: &NewQuoteRequest,
    ) -> Result<ProviderRequest, RemoteOperationError> {
        let mut state = self.state();
        state.calls.created_requests.push(request.clone());

        if self.failures.requests_for.contains(&request.supplier_name) {
            return Err(RemoteOperationError::failed(
                RemoteOperation::CreateQuoteRequest,
                format!("request for `{}` was refused", request.supplier_name),
            ));
        }

        let created = ProviderRequest {
            id: RequestId(Uuid::new_v4().to_string()),
            name: request.supplier_name.clone(),
            email: request.supplier_email.clone(),
            status: RequestStatus::Pending,
            sent_at: Utc::now(),
        };
        state.requests.push((request.category.clone(), created.clone()));
        Ok(created)
    }

    async fn assign_supplier_to_service(
        &self,
        role: &str,
        assignment: &SupplierAssignment,
    ) -> Result<(), RemoteOperationError> {
        let mut state = self.state();
        state.calls.assignments.push((role.to_string(), assignment.clone()));
        if self.failures.assignments {
            return Err(RemoteOperationError::failed(
                RemoteOperation::AssignSupplier,
                "service slot is locked",
            ));
        }
        Ok(())
    }

    async fn budget_categories(&self) -> Result<Vec<BudgetCategory>, RemoteOperationError> {
        self.check_listing(RemoteOperation::ListBudgetCategories)?;
        Ok(self.state().budget.clone())
    }

    async fn update_budget_category(
        &self,
        index: usize,
        amount: Decimal,
    ) -> Result<(), RemoteOperationError> {
        let mut state = self.state();
        state.calls.budget_updates.push((index, amount));
        if self.failures.budget_updates {
            return Err(RemoteOperationError::failed(
                RemoteOperation::UpdateBudgetCategory,
                "budget is read-only",
            ));
        }
        let category = state.budget.get_mut(index).ok_or_else(|| {
            RemoteOperationError::not_found(RemoteOperation::UpdateBudgetCategory, index.to_string())
        })?;
        category.amount = amount;
        Ok(())
    }
}
