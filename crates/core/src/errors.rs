use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::quote::{QuoteEvent, QuoteStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid quote transition from {from:?} using event {event:?}")]
    InvalidQuoteTransition { from: QuoteStatus, event: QuoteEvent },
}

/// Raised before any remote call is attempted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quote has no id")]
    MissingQuoteId,
    #[error("{action} requires explicit confirmation")]
    ConfirmationRequired { action: &'static str },
    #[error("no favorite providers were selected")]
    EmptySelection,
    #[error("accepting this quote leaves the category budget at {remaining}")]
    OverBudget { remaining: Decimal },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOperation {
    ListRequests,
    ListResponses,
    UpdateQuoteStatus,
    CancelProviderRequests,
    CreateQuoteRequest,
    AssignSupplier,
    ListBudgetCategories,
    UpdateBudgetCategory,
    LoadHiddenProviders,
    SaveHiddenProviders,
}

impl RemoteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRequests => "list_requests",
            Self::ListResponses => "list_responses",
            Self::UpdateQuoteStatus => "update_quote_status",
            Self::CancelProviderRequests => "cancel_provider_requests",
            Self::CreateQuoteRequest => "create_quote_request",
            Self::AssignSupplier => "assign_supplier_to_service",
            Self::ListBudgetCategories => "list_budget_categories",
            Self::UpdateBudgetCategory => "update_budget_category",
            Self::LoadHiddenProviders => "load_hidden_providers",
            Self::SaveHiddenProviders => "save_hidden_providers",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call to an external collaborator failed. Caught at the call site and folded into outcomes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteOperationError {
    #[error("{operation} failed: {message}")]
    Failed { operation: RemoteOperation, message: String },
    #[error("{operation}: record `{id}` was not found")]
    NotFound { operation: RemoteOperation, id: String },
}

impl RemoteOperationError {
    pub fn failed(operation: RemoteOperation, message: impl Into<String>) -> Self {
        Self::Failed { operation, message: message.into() }
    }

    pub fn not_found(operation: RemoteOperation, id: impl Into<String>) -> Self {
        Self::NotFound { operation, id: id.into() }
    }

    pub fn operation(&self) -> RemoteOperation {
        match self {
            Self::Failed { operation, .. } | Self::NotFound { operation, .. } => *operation,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Remote(#[from] RemoteOperationError),
}

impl WorkflowError {
    /// Stable machine-readable class used by command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Domain(_) => "validation",
            Self::Remote(_) => "remote_operation",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MissingQuoteId) => "Error: the quote is not valid.",
            Self::Validation(ValidationError::ConfirmationRequired { .. }) => {
                "The action was not confirmed; nothing was changed."
            }
            Self::Validation(ValidationError::EmptySelection) => {
                "Select at least one favorite provider."
            }
            Self::Validation(ValidationError::OverBudget { .. }) => {
                "Accepting this quote would exceed the category budget."
            }
            Self::Domain(_) => "The quote cannot move to that state from its current status.",
            Self::Remote(_) => "The quote store could not complete the operation. Try again.",
        }
    }
}
