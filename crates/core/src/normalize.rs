//! Canonical keys for grouping providers and matching budget categories.

use crate::domain::provider::ProviderId;

pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Lower-cases, trims, and joins whitespace-separated words with single hyphens.
///
/// Empty or whitespace-only names map to [`UNKNOWN_PROVIDER`]. Applying the function twice
/// yields the same key as applying it once.
pub fn normalize_provider_name(name: &str) -> String {
    let key = name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
    if key.is_empty() {
        UNKNOWN_PROVIDER.to_string()
    } else {
        key
    }
}

pub fn provider_id(name: &str) -> ProviderId {
    ProviderId(normalize_provider_name(name))
}

/// Case and diacritic insensitive key, so that `Fotografía` matches `fotografia`.
pub fn normalize_category_key(name: &str) -> String {
    slug::slugify(name.trim())
}

pub fn same_category(left: &str, right: &str) -> bool {
    let left = normalize_category_key(left);
    !left.is_empty() && left == normalize_category_key(right)
}

#[cfg(test)]
mod tests {
    use super::{normalize_category_key, normalize_provider_name, same_category, UNKNOWN_PROVIDER};

    #[test]
    fn collapses_case_and_whitespace_runs() {
        assert_eq!(normalize_provider_name("  Studio  Fénix \t Bodas "), "studio-fénix-bodas");
        assert_eq!(normalize_provider_name("studio-fénix"), "studio-fénix");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["Foto Lux", "  DJ\n\nMarco  ", "", "   ", "Ñandú Catering", "a-b c"] {
            let once = normalize_provider_name(raw);
            assert_eq!(normalize_provider_name(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn empty_and_blank_names_fall_back_to_unknown() {
        assert_eq!(normalize_provider_name(""), UNKNOWN_PROVIDER);
        assert_eq!(normalize_provider_name(" \t "), UNKNOWN_PROVIDER);
    }

    #[test]
    fn request_and_quote_spellings_share_a_key() {
        assert_eq!(normalize_provider_name("Studio  Fénix"), normalize_provider_name("studio-fénix"));
    }

    #[test]
    fn category_keys_ignore_case_and_diacritics() {
        assert_eq!(normalize_category_key("Fotografía"), "fotografia");
        assert!(same_category("Música y DJ", "musica y dj"));
        assert!(!same_category("", ""));
        assert!(!same_category("Catering", "Fotografía"));
    }
}
