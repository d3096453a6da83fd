//! Price derivation for accepted quotes.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteResponse;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    TotalPrice,
    Amount,
    Price,
    ServicesIncluded,
    Description,
    Unavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedPrice {
    pub amount: Decimal,
    pub source: PriceSource,
}

impl DerivedPrice {
    pub fn is_available(&self) -> bool {
        self.source != PriceSource::Unavailable
    }
}

fn euro_amount_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:,\d+)?(?:\.\d+)?)\s*€").ok()).as_ref()
}

/// First `<number> €` amount found in `text`. A single thousands comma is dropped.
pub fn extract_euro_amount(text: &str) -> Option<Decimal> {
    let captures = euro_amount_pattern()?.captures(text)?;
    let raw = captures.get(1)?.as_str().replacen(',', "", 1);
    Decimal::from_str(&raw).ok().filter(|amount| *amount > Decimal::ZERO)
}

/// Fallback chain: `totalPrice`, `amount`, `price`, then amounts written in the services list,
/// then in the description. Missing everywhere yields zero with [`PriceSource::Unavailable`].
pub fn derive_price(quote: &QuoteResponse) -> DerivedPrice {
    let explicit = [
        (quote.total_price, PriceSource::TotalPrice),
        (quote.amount, PriceSource::Amount),
        (quote.price, PriceSource::Price),
    ];
    for (value, source) in explicit {
        if let Some(amount) = value.filter(|amount| *amount > Decimal::ZERO) {
            return DerivedPrice { amount, source };
        }
    }

    if let Some(amount) = quote.services_included.iter().find_map(|item| extract_euro_amount(item))
    {
        return DerivedPrice { amount, source: PriceSource::ServicesIncluded };
    }

    if let Some(amount) = quote.description.as_deref().and_then(extract_euro_amount) {
        return DerivedPrice { amount, source: PriceSource::Description };
    }

    DerivedPrice { amount: Decimal::ZERO, source: PriceSource::Unavailable }
}
