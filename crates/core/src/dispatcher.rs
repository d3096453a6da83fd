//! Sends quote requests to favorite providers in bulk.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditKind, AuditOutcome, AuditSink};
use crate::domain::favorite::{Favorite, FavoriteId};
use crate::domain::request::ProviderRequest;
use crate::errors::{ValidationError, WorkflowError};
use crate::normalize::same_category;
use crate::store::{NewQuoteRequest, QuoteStore};
use crate::workflow::{CategoryScope, DEFAULT_ACTOR};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchFailure {
    pub favorite_id: FavoriteId,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub success_count: u32,
    pub error_count: u32,
    pub failures: Vec<DispatchFailure>,
    pub created: Vec<ProviderRequest>,
    /// Selected ids that are not favorites of the current category. Skipped, not failed.
    pub ignored: Vec<FavoriteId>,
}

impl DispatchSummary {
    pub fn audit_outcome(&self) -> AuditOutcome {
        match (self.success_count, self.error_count) {
            (_, 0) => AuditOutcome::Success,
            (0, _) => AuditOutcome::Failed,
            _ => AuditOutcome::Partial,
        }
    }

    pub fn message(&self) -> String {
        match self.audit_outcome() {
            AuditOutcome::Success => format!("Sent {} quote request(s).", self.success_count),
            AuditOutcome::Failed => {
                format!("No quote request could be sent ({} failed).", self.error_count)
            }
            _ => format!(
                "Sent {} quote request(s); {} could not be sent.",
                self.success_count, self.error_count
            ),
        }
    }
}

pub struct FavoritesDispatcher<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    scope: CategoryScope,
    actor: String,
    correlation_id: String,
}

impl<S, A> FavoritesDispatcher<S, A>
where
    S: QuoteStore,
    A: AuditSink,
{
    pub fn new(store: Arc<S>, audit: Arc<A>, scope: CategoryScope) -> Self {
        Self {
            store,
            audit,
            scope,
            actor: DEFAULT_ACTOR.to_string(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Favorites whose category (or service) matches the current scope.
    pub fn in_scope<'a>(&self, favorites: &'a [Favorite]) -> Vec<&'a Favorite> {
        favorites
            .iter()
            .filter(|favorite| {
                let hint = favorite.supplier.category_hint();
                same_category(hint, &self.scope.category) || same_category(hint, &self.scope.label)
            })
            .collect()
    }

    /// Sends one request per selected favorite, in selection order.
    ///
    /// The selection is first narrowed to the favorites of the current category; ids outside it
    /// are listed in `ignored`. Individual send failures are counted and the loop continues.
    pub async fn request_quotes_for_selected(
        &self,
        selected: &[FavoriteId],
        favorites: &[Favorite],
    ) -> Result<DispatchSummary, WorkflowError> {
        let candidates = self.in_scope(favorites);
        let mut summary = DispatchSummary::default();
        let mut chosen = Vec::with_capacity(selected.len());
        for favorite_id in selected {
            match candidates.iter().find(|favorite| &favorite.id == favorite_id) {
                Some(favorite) => chosen.push(*favorite),
                None => summary.ignored.push(favorite_id.clone()),
            }
        }
        if !summary.ignored.is_empty() {
            debug!(
                event_name = "dispatch.favorites.ignored",
                category = %self.scope.category,
                ignored = summary.ignored.len(),
                "selected ids outside the category were skipped"
            );
        }
        if chosen.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }

        for favorite in chosen {
            let favorite_id = &favorite.id;
            let request = self.build_request(favorite);
            match self.store.create_quote_request(&request).await {
                Ok(created) => {
                    summary.success_count += 1;
                    summary.created.push(created);
                }
                Err(error) => {
                    warn!(
                        event_name = "dispatch.favorite.failed",
                        category = %self.scope.category,
                        favorite_id = %favorite_id,
                        error = %error,
                        "quote request could not be sent"
                    );
                    summary.error_count += 1;
                    summary.failures.push(DispatchFailure {
                        favorite_id: favorite_id.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        info!(
            event_name = "dispatch.favorites.completed",
            category = %self.scope.category,
            success_count = summary.success_count,
            error_count = summary.error_count,
            "favorite quote requests dispatched"
        );
        self.audit.emit(
            AuditEvent::new(
                self.scope.category.clone(),
                None,
                self.correlation_id.clone(),
                "favorites.dispatched",
                AuditKind::Dispatch,
                self.actor.clone(),
                summary.audit_outcome(),
            )
            .with_metadata("selected", selected.len())
            .with_metadata("ignored", summary.ignored.len())
            .with_metadata("success_count", summary.success_count)
            .with_metadata("error_count", summary.error_count),
        );

        Ok(summary)
    }

    fn build_request(&self, favorite: &Favorite) -> NewQuoteRequest {
        let supplier = &favorite.supplier;
        NewQuoteRequest {
            supplier_id: supplier.identity().map(str::to_string),
            supplier_name: supplier.name.clone(),
            supplier_email: supplier.email.clone(),
            category: self.scope.category.clone(),
            service: self.scope.label.clone(),
            message: format!("Quote request for {}", self.scope.label),
            urgent: false,
        }
    }
}
