use tracing::{info, warn};

use super::{AcceptanceWorkflow, Confirmation, DeleteProviderReport};
use crate::audit::{AuditKind, AuditOutcome, AuditSink};
use crate::domain::provider::{ProviderAggregate, ProviderId};
use crate::domain::quote::QuoteEvent;
use crate::errors::WorkflowError;
use crate::hidden::HiddenProviderStore;
use crate::store::QuoteStore;

pub const PROVIDER_REMOVED_NOTE: &str = "Provider removed";

impl<S, H, A> AcceptanceWorkflow<S, H, A>
where
    S: QuoteStore,
    H: HiddenProviderStore,
    A: AuditSink,
{
    /// Hides the provider, cancels its open requests, and rejects every attached quote.
    ///
    /// The hide happens first and is never rolled back. The remaining steps keep going past
    /// individual failures and are tallied in the report.
    pub async fn delete_provider(
        &mut self,
        provider: &ProviderAggregate,
        confirmation: Confirmation,
    ) -> Result<DeleteProviderReport, WorkflowError> {
        confirmation.require("delete provider")?;

        let mut report = DeleteProviderReport::new(provider.id.clone(), provider.name.clone());
        self.hidden.hide(provider.id.clone());
        self.persist_hidden().await;
        report.hidden = true;

        let target = provider.cancellation_target(self.scope.category.clone());
        if target.is_empty() {
            report.record_cancel_failure(
                "provider has neither a request id nor an email to cancel by",
            );
        } else {
            match self.store.cancel_provider_requests(&target).await {
                Ok(result) => {
                    report.cancel_succeeded = true;
                    report.cancelled_requests = result.cancelled;
                }
                Err(error) => report.record_cancel_failure(error.to_string()),
            }
        }

        for quote in &provider.quotes {
            let event = QuoteEvent::ProviderRemoved;
            match self.apply_quote_event(quote, event, PROVIDER_REMOVED_NOTE).await {
                Ok(_) => report.rejected_quotes += 1,
                Err(WorkflowError::Validation(_)) => {
                    report.record_reject_failure(format!(
                        "quote from {} has no id",
                        quote.supplier_name
                    ));
                }
                Err(error) => {
                    warn!(
                        event_name = "workflow.provider.quote_reject_failed",
                        category = %self.scope.category,
                        provider_id = %provider.id,
                        quote_id = %quote.id,
                        error = %error,
                        "quote could not be rejected during provider removal"
                    );
                    report.record_reject_failure(format!("{}: {error}", quote.id));
                }
            }
        }

        report.view = self.refreshed_view().await;

        let outcome = report.outcome();
        info!(
            event_name = "workflow.provider.deleted",
            category = %self.scope.category,
            provider_id = %provider.id,
            cancelled_requests = report.cancelled_requests,
            rejected_quotes = report.rejected_quotes,
            cancel_errors = report.cancel_errors,
            rejected_errors = report.rejected_errors,
            outcome = ?outcome,
            "provider removal finished"
        );
        self.audit.emit(
            self.audit_event(
                "provider.deleted",
                AuditKind::ProviderRemoval,
                Some(provider.id.0.clone()),
                outcome.audit_outcome(),
            )
            .with_metadata("cancelled_requests", report.cancelled_requests)
            .with_metadata("rejected_quotes", report.rejected_quotes)
            .with_metadata("cancel_errors", report.cancel_errors)
            .with_metadata("rejected_errors", report.rejected_errors),
        );

        Ok(report)
    }

    /// Shows a hidden provider again. Returns `false` when it was not hidden.
    pub async fn unhide_provider(&mut self, id: &ProviderId) -> bool {
        if !self.hidden.unhide(id) {
            return false;
        }
        self.persist_hidden().await;

        info!(
            event_name = "workflow.provider.unhidden",
            category = %self.scope.category,
            provider_id = %id,
            "provider visible again"
        );
        self.audit.emit(self.audit_event(
            "provider.unhidden",
            AuditKind::ProviderRestore,
            Some(id.0.clone()),
            AuditOutcome::Success,
        ));
        true
    }
}
