use tracing::{info, warn};

use super::{
    AcceptanceOutcome, AcceptanceWorkflow, BudgetUpdate, Confirmation, StatusChangeOutcome,
    StepOutcome,
};
use crate::audit::{AuditKind, AuditOutcome, AuditSink};
use crate::budget::find_budget_category;
use crate::domain::quote::{QuoteEvent, QuoteResponse, QuoteStatus};
use crate::errors::{DomainError, ValidationError, WorkflowError};
use crate::hidden::HiddenProviderStore;
use crate::normalize::normalize_provider_name;
use crate::pricing::{derive_price, DerivedPrice};
use crate::store::{QuoteStore, SupplierAssignment, CONTRACTED_STATUS_LABEL};

pub const ACCEPTED_NOTE: &str = "accepted";
pub const REJECTED_NOTE: &str = "rejected";
pub const RESTORED_NOTE: &str = "restored";

impl<S, H, A> AcceptanceWorkflow<S, H, A>
where
    S: QuoteStore,
    H: HiddenProviderStore,
    A: AuditSink,
{
    /// Accepts `quote`, books its provider into the `role` slot, and moves the matching budget
    /// line to the derived price.
    ///
    /// Only the status update can fail the call. Slot and budget failures are reported in the
    /// outcome because the quote is already accepted by then.
    pub async fn accept_quote(
        &self,
        quote: &QuoteResponse,
        role: &str,
        notes: Option<&str>,
    ) -> Result<AcceptanceOutcome, WorkflowError> {
        let update = self.apply_quote_event(quote, QuoteEvent::Accept, ACCEPTED_NOTE).await;
        let accepted = match update {
            Ok(accepted) => accepted,
            Err(error) => {
                self.audit_failure("quote.accepted", AuditKind::Acceptance, quote, &error);
                return Err(error);
            }
        };

        let price = derive_price(quote);
        let assignment = self.assign_provider(quote, role, notes, price).await;
        let budget = self.update_budget_line(price).await;
        let view = self.refreshed_view().await;

        let message = if price.is_available() {
            format!("Quote from {} accepted at {} €.", quote.supplier_name, price.amount)
        } else {
            format!(
                "Quote from {} accepted. No price was found, so the budget was not updated.",
                quote.supplier_name
            )
        };

        let outcome = AcceptanceOutcome { quote: accepted, price, assignment, budget, view, message };

        info!(
            event_name = "workflow.quote.accepted",
            category = %self.scope.category,
            quote_id = %quote.id,
            role,
            price = %price.amount,
            price_available = price.is_available(),
            follow_up_failures = outcome.follow_up_failures().len(),
            "quote accepted"
        );
        self.audit.emit(
            self.audit_event(
                "quote.accepted",
                AuditKind::Acceptance,
                Some(quote.id.0.clone()),
                outcome.audit_outcome(),
            )
            .with_metadata("role", role)
            .with_metadata("price", price.amount)
            .with_metadata("price_available", price.is_available()),
        );

        Ok(outcome)
    }

    pub async fn reject_quote(
        &self,
        quote: &QuoteResponse,
        confirmation: Confirmation,
    ) -> Result<StatusChangeOutcome, WorkflowError> {
        confirmation.require("reject quote")?;
        self.change_status(
            quote,
            QuoteEvent::Reject,
            REJECTED_NOTE,
            "quote.rejected",
            AuditKind::Rejection,
        )
        .await
    }

    pub async fn restore_quote(
        &self,
        quote: &QuoteResponse,
        confirmation: Confirmation,
    ) -> Result<StatusChangeOutcome, WorkflowError> {
        confirmation.require("restore quote")?;
        self.change_status(
            quote,
            QuoteEvent::Restore,
            RESTORED_NOTE,
            "quote.restored",
            AuditKind::Restoration,
        )
        .await
    }

    async fn change_status(
        &self,
        quote: &QuoteResponse,
        event: QuoteEvent,
        note: &str,
        event_type: &'static str,
        kind: AuditKind,
    ) -> Result<StatusChangeOutcome, WorkflowError> {
        let updated = match self.apply_quote_event(quote, event, note).await {
            Ok(updated) => updated,
            Err(error) => {
                self.audit_failure(event_type, kind, quote, &error);
                return Err(error);
            }
        };
        let target = updated.status;

        info!(
            event_name = %format!("workflow.{event_type}"),
            category = %self.scope.category,
            quote_id = %quote.id,
            status = target.as_str(),
            "quote status changed"
        );
        self.audit.emit(
            self.audit_event(event_type, kind, Some(quote.id.0.clone()), AuditOutcome::Success)
                .with_metadata("status", target.as_str()),
        );

        let message = match target {
            QuoteStatus::Rejected => format!("Quote from {} rejected.", quote.supplier_name),
            QuoteStatus::Received => format!("Quote from {} restored.", quote.supplier_name),
            QuoteStatus::Accepted => format!("Quote from {} accepted.", quote.supplier_name),
        };
        Ok(StatusChangeOutcome { quote: updated, view: self.refreshed_view().await, message })
    }

    /// Checks `event` against the quote's current status and writes the resulting status.
    ///
    /// Every status write of the workflow goes through here, provider removal included, so a
    /// quote without an id or an event its status does not allow never reaches the store.
    pub(super) async fn apply_quote_event(
        &self,
        quote: &QuoteResponse,
        event: QuoteEvent,
        note: &str,
    ) -> Result<QuoteResponse, WorkflowError> {
        let target = ensure_transition(quote, event)?;
        Ok(self.store.update_quote_status(&quote.id, target, Some(note)).await?)
    }

    async fn assign_provider(
        &self,
        quote: &QuoteResponse,
        role: &str,
        notes: Option<&str>,
        price: DerivedPrice,
    ) -> StepOutcome {
        let supplier_id = quote
            .supplier_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| normalize_provider_name(&quote.supplier_name));
        let notes = match (notes, quote.description.as_deref()) {
            (Some(notes), _) => notes.to_string(),
            (None, Some(description)) => format!("Quote accepted - {description}"),
            (None, None) => "Quote accepted".to_string(),
        };
        let assignment = SupplierAssignment {
            supplier_id,
            supplier_name: quote.supplier_name.clone(),
            supplier_email: quote.supplier_email.clone(),
            supplier_phone: quote.supplier_phone.clone(),
            price: price.amount,
            notes,
            status_label: CONTRACTED_STATUS_LABEL.to_string(),
        };

        match self.store.assign_supplier_to_service(role, &assignment).await {
            Ok(()) => StepOutcome::Completed,
            Err(error) => {
                warn!(
                    event_name = "workflow.quote.assignment_failed",
                    category = %self.scope.category,
                    quote_id = %quote.id,
                    role,
                    error = %error,
                    "provider could not be assigned to the service slot"
                );
                StepOutcome::Failed { message: error.to_string() }
            }
        }
    }

    async fn update_budget_line(&self, price: DerivedPrice) -> BudgetUpdate {
        if !price.is_available() {
            return BudgetUpdate::SkippedNoPrice;
        }

        let categories = match self.store.budget_categories().await {
            Ok(categories) => categories,
            Err(error) => return self.budget_failure(error.to_string()),
        };
        let Some(index) = find_budget_category(&categories, &self.scope.category)
            .or_else(|| find_budget_category(&categories, &self.scope.label))
        else {
            return BudgetUpdate::SkippedNoCategory;
        };

        match self.store.update_budget_category(index, price.amount).await {
            Ok(()) => BudgetUpdate::Updated {
                index,
                category: categories[index].name.clone(),
                amount: price.amount,
            },
            Err(error) => self.budget_failure(error.to_string()),
        }
    }

    fn budget_failure(&self, message: String) -> BudgetUpdate {
        warn!(
            event_name = "workflow.quote.budget_failed",
            category = %self.scope.category,
            error = %message,
            "budget line could not be updated"
        );
        BudgetUpdate::Failed { message }
    }

    fn audit_failure(
        &self,
        event_type: &str,
        kind: AuditKind,
        quote: &QuoteResponse,
        error: &WorkflowError,
    ) {
        if !matches!(error, WorkflowError::Remote(_)) {
            return;
        }
        warn!(
            event_name = "workflow.quote.status_failed",
            category = %self.scope.category,
            quote_id = %quote.id,
            error = %error,
            "quote status could not be updated"
        );
        self.audit.emit(
            self.audit_event(event_type, kind, Some(quote.id.0.clone()), AuditOutcome::Failed)
                .with_metadata("error", error),
        );
    }
}

/// Validates the quote locally so that invalid requests never reach the store.
fn ensure_transition(quote: &QuoteResponse, event: QuoteEvent) -> Result<QuoteStatus, WorkflowError> {
    if quote.id.is_blank() {
        return Err(ValidationError::MissingQuoteId.into());
    }
    crate::domain::quote::next_status(quote.status, event)
        .ok_or_else(|| DomainError::InvalidQuoteTransition { from: quote.status, event }.into())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::audit::{AuditKind, AuditOutcome};
    use crate::budget::{BudgetDecision, OverBudgetPolicy};
    use crate::domain::budget::BudgetCategory;
    use crate::domain::quote::{QuoteId, QuoteStatus};
    use crate::errors::{ValidationError, WorkflowError};
    use crate::pricing::PriceSource;
    use crate::store::{FailurePlan, InMemoryQuoteStore};
    use crate::test_fixtures::{harness, quote, request, CATEGORY};
    use crate::workflow::{BudgetUpdate, Confirmation, StepOutcome};

    fn seeded_store() -> InMemoryQuoteStore {
        InMemoryQuoteStore::new()
            .with_request(CATEGORY, request("r-1", "Foto Lux", Some("hola@fotolux.es")))
            .with_response(CATEGORY, quote("q-1", "Foto Lux", Some(1500)))
            .with_budget(vec![
                BudgetCategory { name: "Catering".to_string(), amount: Decimal::new(9000, 0) },
                BudgetCategory { name: "Fotografía".to_string(), amount: Decimal::ZERO },
            ])
    }

    #[tokio::test]
    async fn accept_books_provider_and_updates_budget_line() {
        let h = harness(seeded_store());
        let outcome = h
            .workflow
            .accept_quote(&quote("q-1", "Foto Lux", Some(1500)), CATEGORY, None)
            .await
            .expect("accept");

        assert_eq!(outcome.quote.status, QuoteStatus::Accepted);
        assert!(outcome.price_available());
        assert_eq!(outcome.assignment, StepOutcome::Completed);
        assert_eq!(
            outcome.budget,
            BudgetUpdate::Updated {
                index: 1,
                category: "Fotografía".to_string(),
                amount: Decimal::new(1500, 0)
            }
        );
        assert_eq!(h.store.budget()[1].amount, Decimal::new(1500, 0));

        let calls = h.store.calls();
        assert_eq!(calls.assignments.len(), 1);
        assert_eq!(calls.assignments[0].1.supplier_id, "foto-lux");
        assert_eq!(calls.assignments[0].1.status_label, "contracted");

        let view = outcome.view.expect("refreshed view");
        assert!(view.providers[0].quotes[0].is_accepted());

        let events = h.audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuditKind::Acceptance);
        assert_eq!(events[0].outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn accepting_twice_leaves_the_same_state() {
        let h = harness(seeded_store());
        let candidate = quote("q-1", "Foto Lux", Some(1500));

        let first = h.workflow.accept_quote(&candidate, CATEGORY, None).await.expect("first");
        let mut again = candidate.clone();
        again.status = QuoteStatus::Accepted;
        let second = h.workflow.accept_quote(&again, CATEGORY, None).await.expect("second");

        assert_eq!(first.quote.status, second.quote.status);
        assert_eq!(first.budget, second.budget);
        assert_eq!(h.store.budget()[1].amount, Decimal::new(1500, 0));
    }

    #[tokio::test]
    async fn price_written_in_services_is_used_for_the_assignment() {
        let mut candidate = quote("q-1", "Foto Lux", None);
        candidate.services_included = vec!["DJ set 500€".to_string()];
        let h = harness(seeded_store());

        let outcome = h.workflow.accept_quote(&candidate, CATEGORY, None).await.expect("accept");

        assert_eq!(outcome.price.amount, Decimal::new(500, 0));
        assert_eq!(outcome.price.source, PriceSource::ServicesIncluded);
        assert_eq!(h.store.calls().assignments[0].1.price, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn missing_price_still_accepts_but_skips_budget() {
        let h = harness(seeded_store());
        let outcome = h
            .workflow
            .accept_quote(&quote("q-1", "Foto Lux", None), CATEGORY, Some("Booked by phone"))
            .await
            .expect("accept");

        assert!(!outcome.price_available());
        assert_eq!(outcome.price.amount, Decimal::ZERO);
        assert_eq!(outcome.budget, BudgetUpdate::SkippedNoPrice);
        assert!(outcome.message.contains("No price was found"));
        assert_eq!(h.store.calls().assignments[0].1.notes, "Booked by phone");
        assert!(h.store.calls().budget_updates.is_empty());
    }

    #[tokio::test]
    async fn follow_up_failures_do_not_fail_the_acceptance() {
        let store = seeded_store().with_failures(FailurePlan {
            assignments: true,
            budget_updates: true,
            ..FailurePlan::default()
        });
        let h = harness(store);

        let outcome = h
            .workflow
            .accept_quote(&quote("q-1", "Foto Lux", Some(1500)), CATEGORY, None)
            .await
            .expect("accept");

        assert_eq!(outcome.quote.status, QuoteStatus::Accepted);
        assert_eq!(outcome.follow_up_failures().len(), 2);
        assert_eq!(h.audit.events()[0].outcome, AuditOutcome::Partial);
    }

    #[tokio::test]
    async fn unmatched_budget_category_is_skipped() {
        let store = InMemoryQuoteStore::new()
            .with_response(CATEGORY, quote("q-1", "Foto Lux", Some(800)))
            .with_budget(vec![BudgetCategory {
                name: "Catering".to_string(),
                amount: Decimal::ZERO,
            }]);
        let h = harness(store);

        let outcome = h
            .workflow
            .accept_quote(&quote("q-1", "Foto Lux", Some(800)), CATEGORY, None)
            .await
            .expect("accept");
        assert_eq!(outcome.budget, BudgetUpdate::SkippedNoCategory);
    }

    #[tokio::test]
    async fn status_failure_aborts_before_any_follow_up() {
        let store = seeded_store().with_failures(FailurePlan {
            status_updates: [QuoteId("q-1".to_string())].into_iter().collect(),
            ..FailurePlan::default()
        });
        let h = harness(store);

        let error = h
            .workflow
            .accept_quote(&quote("q-1", "Foto Lux", Some(1500)), CATEGORY, None)
            .await
            .expect_err("status update fails");

        assert_eq!(error.error_class(), "remote_operation");
        assert!(h.store.calls().assignments.is_empty());
        assert_eq!(h.audit.events()[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn reject_without_id_never_reaches_the_store() {
        let h = harness(seeded_store());
        let error = h
            .workflow
            .reject_quote(&quote("  ", "Foto Lux", None), Confirmation::Confirmed)
            .await
            .expect_err("missing id");

        assert_eq!(error, WorkflowError::Validation(ValidationError::MissingQuoteId));
        assert!(h.store.calls().status_updates.is_empty());
    }

    #[tokio::test]
    async fn declined_confirmation_changes_nothing() {
        let h = harness(seeded_store());
        let error = h
            .workflow
            .reject_quote(&quote("q-1", "Foto Lux", None), Confirmation::Declined)
            .await
            .expect_err("declined");

        assert_eq!(error.error_class(), "validation");
        assert!(h.store.calls().status_updates.is_empty());
        let stored = h.store.quote(&QuoteId("q-1".to_string())).expect("stored quote");
        assert_eq!(stored.status, QuoteStatus::Received);
    }

    #[tokio::test]
    async fn reject_then_restore_round_trips_the_status() {
        let h = harness(seeded_store());
        let rejected = h
            .workflow
            .reject_quote(&quote("q-1", "Foto Lux", None), Confirmation::Confirmed)
            .await
            .expect("reject");
        assert_eq!(rejected.quote.status, QuoteStatus::Rejected);

        let restored = h
            .workflow
            .restore_quote(&rejected.quote, Confirmation::Confirmed)
            .await
            .expect("restore");
        assert_eq!(restored.quote.status, QuoteStatus::Received);
        assert_eq!(h.audit.events().len(), 2);
    }

    #[tokio::test]
    async fn every_status_write_carries_a_note() {
        let h = harness(seeded_store());
        let rejected = h
            .workflow
            .reject_quote(&quote("q-1", "Foto Lux", Some(1500)), Confirmation::Confirmed)
            .await
            .expect("reject");
        let restored = h
            .workflow
            .restore_quote(&rejected.quote, Confirmation::Confirmed)
            .await
            .expect("restore");
        h.workflow.accept_quote(&restored.quote, CATEGORY, None).await.expect("accept");

        let notes: Vec<_> =
            h.store.calls().status_updates.into_iter().map(|(_, _, note)| note).collect();
        assert_eq!(
            notes,
            vec![
                Some("rejected".to_string()),
                Some("restored".to_string()),
                Some("accepted".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn accepted_quote_cannot_be_rejected_directly() {
        let h = harness(seeded_store());
        let mut accepted = quote("q-1", "Foto Lux", None);
        accepted.status = QuoteStatus::Accepted;

        let error = h
            .workflow
            .reject_quote(&accepted, Confirmation::Confirmed)
            .await
            .expect_err("invalid transition");
        assert_eq!(error.error_class(), "validation");
        assert!(h.store.calls().status_updates.is_empty());
    }

    #[tokio::test]
    async fn budget_check_follows_the_configured_policy() {
        let candidate = quote("q-1", "Foto Lux", Some(1500));
        let total = Decimal::new(1000, 0);

        let warn = harness(seeded_store()).workflow;
        let check =
            warn.check_budget(&candidate, total, Confirmation::Declined).await.expect("warn");
        assert!(check.impact.is_over_budget);
        assert_eq!(check.impact.remaining_budget, Decimal::new(-500, 0));
        assert_eq!(check.decision, BudgetDecision::ProceedWithWarning);

        let confirm =
            harness(seeded_store()).workflow.with_budget_policy(OverBudgetPolicy::Confirm);
        let declined = confirm.check_budget(&candidate, total, Confirmation::Declined).await;
        assert!(matches!(
            declined,
            Err(WorkflowError::Validation(ValidationError::ConfirmationRequired { .. }))
        ));
        assert!(confirm.check_budget(&candidate, total, Confirmation::Confirmed).await.is_ok());

        let block = harness(seeded_store()).workflow.with_budget_policy(OverBudgetPolicy::Block);
        let blocked = block.check_budget(&candidate, total, Confirmation::Confirmed).await;
        assert!(matches!(
            blocked,
            Err(WorkflowError::Validation(ValidationError::OverBudget { .. }))
        ));

        let within = block
            .check_budget(&candidate, Decimal::new(2000, 0), Confirmation::Declined)
            .await
            .expect("within budget");
        assert_eq!(within.decision, BudgetDecision::Proceed);
    }

    #[tokio::test]
    async fn retried_acceptance_counts_its_price_once_in_the_budget_check() {
        let h = harness(seeded_store());
        let workflow = h.workflow.with_budget_policy(OverBudgetPolicy::Block);
        workflow
            .accept_quote(&quote("q-1", "Foto Lux", Some(1500)), CATEGORY, None)
            .await
            .expect("first accept");

        let accepted = h.store.quote(&QuoteId("q-1".to_string())).expect("stored quote");
        let check = workflow
            .check_budget(&accepted, Decimal::new(2000, 0), Confirmation::Declined)
            .await
            .expect("retry stays within budget");

        assert_eq!(check.impact.current_category_total, Decimal::ZERO);
        assert_eq!(check.impact.new_category_total, Decimal::new(1500, 0));
        assert_eq!(check.decision, BudgetDecision::Proceed);
        workflow.accept_quote(&accepted, CATEGORY, None).await.expect("retried accept");
    }
}
