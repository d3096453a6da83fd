use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregation::ProviderView;
use crate::audit::AuditOutcome;
use crate::budget::BudgetDecision;
use crate::domain::budget::BudgetImpact;
use crate::domain::provider::ProviderId;
use crate::domain::quote::QuoteResponse;
use crate::pricing::DerivedPrice;

/// Result of a follow-up call that does not abort the action when it fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Failed { message: String },
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BudgetUpdate {
    Updated { index: usize, category: String, amount: Decimal },
    SkippedNoPrice,
    SkippedNoCategory,
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceOutcome {
    pub quote: QuoteResponse,
    pub price: DerivedPrice,
    pub assignment: StepOutcome,
    pub budget: BudgetUpdate,
    pub view: Option<ProviderView>,
    pub message: String,
}

impl AcceptanceOutcome {
    pub fn price_available(&self) -> bool {
        self.price.is_available()
    }

    /// Follow-up steps that failed after the quote itself was accepted.
    pub fn follow_up_failures(&self) -> Vec<&str> {
        let mut failures = Vec::new();
        if let StepOutcome::Failed { message } = &self.assignment {
            failures.push(message.as_str());
        }
        if let BudgetUpdate::Failed { message } = &self.budget {
            failures.push(message.as_str());
        }
        failures
    }

    pub fn audit_outcome(&self) -> AuditOutcome {
        if self.follow_up_failures().is_empty() {
            AuditOutcome::Success
        } else {
            AuditOutcome::Partial
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeOutcome {
    pub quote: QuoteResponse,
    pub view: Option<ProviderView>,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Complete,
    Partial,
    Failed,
}

impl DeleteOutcome {
    pub fn audit_outcome(&self) -> AuditOutcome {
        match self {
            Self::Complete => AuditOutcome::Success,
            Self::Partial => AuditOutcome::Partial,
            Self::Failed => AuditOutcome::Failed,
        }
    }
}

/// Per-step tally of a provider removal. The provider stays hidden whatever the outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProviderReport {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub hidden: bool,
    pub cancel_succeeded: bool,
    pub cancelled_requests: u32,
    pub rejected_quotes: u32,
    /// Failures while cancelling the provider's open requests.
    pub cancel_errors: u32,
    /// Quotes that could not be rejected.
    pub rejected_errors: u32,
    pub failures: Vec<String>,
    pub view: Option<ProviderView>,
}

impl DeleteProviderReport {
    pub fn new(provider_id: ProviderId, provider_name: impl Into<String>) -> Self {
        Self {
            provider_id,
            provider_name: provider_name.into(),
            hidden: false,
            cancel_succeeded: false,
            cancelled_requests: 0,
            rejected_quotes: 0,
            cancel_errors: 0,
            rejected_errors: 0,
            failures: Vec::new(),
            view: None,
        }
    }

    pub fn record_cancel_failure(&mut self, message: impl Into<String>) {
        self.cancel_errors += 1;
        self.failures.push(message.into());
    }

    pub fn record_reject_failure(&mut self, message: impl Into<String>) {
        self.rejected_errors += 1;
        self.failures.push(message.into());
    }

    pub fn errors(&self) -> u32 {
        self.cancel_errors + self.rejected_errors
    }

    pub fn outcome(&self) -> DeleteOutcome {
        if self.errors() == 0 {
            DeleteOutcome::Complete
        } else if !self.cancel_succeeded && self.rejected_quotes == 0 {
            DeleteOutcome::Failed
        } else {
            DeleteOutcome::Partial
        }
    }

    pub fn message(&self) -> String {
        let name = &self.provider_name;
        match self.outcome() {
            DeleteOutcome::Complete => format!(
                "Provider {name} removed: {} request(s) cancelled and {} quote(s) rejected.",
                self.cancelled_requests, self.rejected_quotes
            ),
            DeleteOutcome::Partial => format!(
                "Provider {name} hidden, but {} step(s) failed ({} quote(s) rejected). Try again to finish the removal.",
                self.errors(), self.rejected_quotes
            ),
            DeleteOutcome::Failed => format!(
                "Provider {name} is hidden on this device, but its requests could not be cancelled and no quote was rejected."
            ),
        }
    }
}

/// Budget projection for a candidate plus what the configured policy says about it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCheck {
    pub impact: BudgetImpact,
    pub decision: BudgetDecision,
}
