//! Budget impact of accepting a quote, plus the policy applied to over-budget results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::budget::{BudgetCategory, BudgetImpact, SpendEntry, SpendStatus};
use crate::domain::provider::ProviderAggregate;
use crate::domain::quote::{QuoteId, QuoteResponse};
use crate::normalize::same_category;
use crate::pricing::derive_price;

/// Projects what accepting `candidate` does to the category total. Pure.
pub fn compute_impact(
    entries: &[SpendEntry],
    candidate: &QuoteResponse,
    total_budget: Decimal,
) -> BudgetImpact {
    let current_category_total: Decimal = entries
        .iter()
        .filter(|entry| entry.status.is_active())
        .filter_map(|entry| entry.amount)
        .sum();
    let added_amount = derive_price(candidate).amount;
    let new_category_total = current_category_total + added_amount;
    let remaining_budget = total_budget - new_category_total;

    BudgetImpact {
        current_category_total,
        added_amount,
        new_category_total,
        remaining_budget,
        is_over_budget: remaining_budget < Decimal::ZERO,
    }
}

/// Every accepted quote in the view other than `excluding` counts as committed spend.
pub fn committed_spend(providers: &[ProviderAggregate], excluding: &QuoteId) -> Vec<SpendEntry> {
    providers
        .iter()
        .flat_map(|provider| {
            provider.accepted_quotes().filter(|quote| &quote.id != excluding).map(move |quote| {
                SpendEntry {
                    supplier_name: provider.name.clone(),
                    amount: Some(derive_price(quote).amount),
                    status: SpendStatus::Committed,
                }
            })
        })
        .collect()
}

/// Impact of `candidate` against the spend already committed in `providers`.
///
/// The candidate is left out of the committed side, so projecting an already accepted quote
/// counts its price once.
pub fn project_impact(
    providers: &[ProviderAggregate],
    candidate: &QuoteResponse,
    total_budget: Decimal,
) -> BudgetImpact {
    compute_impact(&committed_spend(providers, &candidate.id), candidate, total_budget)
}

/// Position of the budget line matching `category`, compared by normalized key.
pub fn find_budget_category(categories: &[BudgetCategory], category: &str) -> Option<usize> {
    categories.iter().position(|candidate| same_category(&candidate.name, category))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverBudgetPolicy {
    Allow,
    #[default]
    Warn,
    Confirm,
    Block,
}

impl OverBudgetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Confirm => "confirm",
            Self::Block => "block",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "warn" => Some(Self::Warn),
            "confirm" => Some(Self::Confirm),
            "block" => Some(Self::Block),
            _ => None,
        }
    }

    pub fn decide(&self, impact: &BudgetImpact) -> BudgetDecision {
        if !impact.is_over_budget {
            return BudgetDecision::Proceed;
        }
        match self {
            Self::Allow => BudgetDecision::Proceed,
            Self::Warn => BudgetDecision::ProceedWithWarning,
            Self::Confirm => BudgetDecision::RequiresConfirmation,
            Self::Block => BudgetDecision::Blocked,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetDecision {
    Proceed,
    ProceedWithWarning,
    RequiresConfirmation,
    Blocked,
}

impl BudgetDecision {
    pub fn allows_acceptance(&self, confirmed: bool) -> bool {
        match self {
            Self::Proceed | Self::ProceedWithWarning => true,
            Self::RequiresConfirmation => confirmed,
            Self::Blocked => false,
        }
    }
}
