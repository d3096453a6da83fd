//! Recommendation scoring for compared quotes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::quote::{QuoteId, QuoteResponse};

pub const MAX_SCORE: u8 = 100;

/// Any of these in the payment terms counts as favorable terms.
pub const FAVORABLE_PAYMENT_TERMS: &[&str] = &["30%", "flexible", "anticipo", "adelanto", "advance"];

/// Any of these in the cancellation policy counts as flexible cancellation.
pub const FLEXIBLE_CANCELLATION_TERMS: &[&str] = &["flexible", "gratis", "free"];

/// Bonus points and thresholds for each scoring rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Awarded to every quote priced at the lowest positive total (default: 40)
    pub best_price_bonus: u8,
    /// Awarded when extraction confidence reaches `confidence_threshold` (default: 20)
    pub confidence_bonus: u8,
    pub confidence_threshold: u8,
    /// Awarded when at least `services_threshold` services are included (default: 20)
    pub services_bonus: u8,
    pub services_threshold: usize,
    /// Favorable payment terms (default: 10)
    pub payment_terms_bonus: u8,
    /// Flexible or free cancellation (default: 10)
    pub cancellation_bonus: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            best_price_bonus: 40,
            confidence_bonus: 20,
            confidence_threshold: 90,
            services_bonus: 20,
            services_threshold: 5,
            payment_terms_bonus: 10,
            cancellation_bonus: 10,
        }
    }
}

impl ScoringRules {
    pub fn max_total(&self) -> u32 {
        [
            self.best_price_bonus,
            self.confidence_bonus,
            self.services_bonus,
            self.payment_terms_bonus,
            self.cancellation_bonus,
        ]
        .iter()
        .map(|bonus| u32::from(*bonus))
        .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreReason {
    BestPrice,
    HighConfidence,
    MoreServices,
    FavorablePaymentTerms,
    FlexibleCancellation,
}

impl ScoreReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BestPrice => "Best price",
            Self::HighConfidence => "High confidence",
            Self::MoreServices => "More services included",
            Self::FavorablePaymentTerms => "Favorable payment terms",
            Self::FlexibleCancellation => "Flexible cancellation",
        }
    }
}

impl Serialize for ScoreReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredQuote {
    #[serde(flatten)]
    pub quote: QuoteResponse,
    pub score: u8,
    pub reasons: Vec<ScoreReason>,
}

/// Score calculator for a set of compared quotes
#[derive(Clone, Debug, Default)]
pub struct QuoteScorer {
    rules: ScoringRules,
}

impl QuoteScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Lowest positive `total_price` among the candidates.
    pub fn best_price(candidates: &[QuoteResponse]) -> Option<Decimal> {
        candidates
            .iter()
            .filter_map(|quote| quote.total_price)
            .filter(|price| *price > Decimal::ZERO)
            .min()
    }

    /// Scores every candidate against the others. Output order follows input order.
    pub fn score(&self, candidates: &[QuoteResponse]) -> Vec<ScoredQuote> {
        let best_price = Self::best_price(candidates);
        candidates.iter().map(|quote| self.score_one(quote, best_price)).collect()
    }

    fn score_one(&self, quote: &QuoteResponse, best_price: Option<Decimal>) -> ScoredQuote {
        let rules = &self.rules;
        let mut score: u32 = 0;
        let mut reasons = Vec::new();

        if best_price.is_some() && quote.total_price == best_price {
            score += u32::from(rules.best_price_bonus);
            reasons.push(ScoreReason::BestPrice);
        }

        if quote.confidence.is_some_and(|confidence| confidence >= rules.confidence_threshold) {
            score += u32::from(rules.confidence_bonus);
            reasons.push(ScoreReason::HighConfidence);
        }

        if quote.services_included.len() >= rules.services_threshold {
            score += u32::from(rules.services_bonus);
            reasons.push(ScoreReason::MoreServices);
        }

        if mentions_any(quote.payment_terms.as_deref(), FAVORABLE_PAYMENT_TERMS) {
            score += u32::from(rules.payment_terms_bonus);
            reasons.push(ScoreReason::FavorablePaymentTerms);
        }

        if mentions_any(quote.cancellation_policy.as_deref(), FLEXIBLE_CANCELLATION_TERMS) {
            score += u32::from(rules.cancellation_bonus);
            reasons.push(ScoreReason::FlexibleCancellation);
        }

        ScoredQuote {
            quote: quote.clone(),
            score: score.min(u32::from(MAX_SCORE)) as u8,
            reasons,
        }
    }
}

fn mentions_any(text: Option<&str>, needles: &[&str]) -> bool {
    let Some(text) = text else {
        return false;
    };
    let text = text.to_lowercase();
    needles.iter().any(|needle| text.contains(needle))
}

/// The strictly highest score; the first of several equal scores wins.
pub fn recommended(scored: &[ScoredQuote]) -> Option<&ScoredQuote> {
    scored.iter().fold(None, |best: Option<&ScoredQuote>, current| match best {
        Some(best) if current.score <= best.score => Some(best),
        _ => Some(current),
    })
}

/// Bounds on how many quotes can be compared side by side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonLimits {
    pub min_selected: usize,
    pub max_selected: usize,
}

impl Default for ComparisonLimits {
    fn default() -> Self {
        Self { min_selected: 2, max_selected: 3 }
    }
}

/// Quotes currently selected for side-by-side comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonSet {
    selected: Vec<QuoteId>,
    limits: ComparisonLimits,
}

impl ComparisonSet {
    /// Starts with the first `max_selected` quotes selected.
    pub fn new(quotes: &[QuoteResponse], limits: ComparisonLimits) -> Self {
        let selected =
            quotes.iter().take(limits.max_selected).map(|quote| quote.id.clone()).collect();
        Self { selected, limits }
    }

    pub fn from_ids(ids: Vec<QuoteId>, limits: ComparisonLimits) -> Self {
        let mut set = Self { selected: Vec::new(), limits };
        for id in ids {
            if !set.selected.contains(&id) && set.selected.len() < limits.max_selected {
                set.selected.push(id);
            }
        }
        set
    }

    /// Adds or removes `id`. Removing below the minimum or adding past the maximum is ignored.
    pub fn toggle(&mut self, id: &QuoteId) -> bool {
        if let Some(position) = self.selected.iter().position(|selected| selected == id) {
            if self.selected.len() > self.limits.min_selected {
                self.selected.remove(position);
                return true;
            }
            return false;
        }

        if self.selected.len() < self.limits.max_selected {
            self.selected.push(id.clone());
            return true;
        }
        false
    }

    pub fn selected(&self) -> &[QuoteId] {
        &self.selected
    }

    /// Selected quotes in source order, never more than the maximum.
    pub fn candidates(&self, quotes: &[QuoteResponse]) -> Vec<QuoteResponse> {
        quotes
            .iter()
            .filter(|quote| self.selected.contains(&quote.id))
            .take(self.limits.max_selected)
            .cloned()
            .collect()
    }
}
