pub mod budget;
pub mod favorite;
pub mod provider;
pub mod quote;
pub mod request;

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing string field.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
