use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of the wedding budget as held by the finance collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendStatus {
    Committed,
    Cancelled,
    Rejected,
}

impl SpendStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Spend already recorded against a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendEntry {
    pub supplier_name: String,
    pub amount: Option<Decimal>,
    pub status: SpendStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetImpact {
    pub current_category_total: Decimal,
    pub added_amount: Decimal,
    pub new_category_total: Decimal,
    pub remaining_budget: Decimal,
    pub is_over_budget: bool,
}
