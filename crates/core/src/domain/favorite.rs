use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteId(pub String);

impl fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSupplier {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl FavoriteSupplier {
    /// Supplier identity sent with a quote request: explicit id, else slug.
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref().or(self.slug.as_deref()).filter(|value| !value.trim().is_empty())
    }

    /// Category used to scope the favorite: explicit category, else service.
    pub fn category_hint(&self) -> &str {
        self.category.as_deref().or(self.service.as_deref()).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    #[serde(default)]
    pub supplier: FavoriteSupplier,
}
