use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use quotedesk_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

/// Effective configuration with where each value came from.
/// Precedence: flag > env > file > default.
pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = options.overrides.clone();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let scoring = &config.scoring;
    let fields = vec![
        field(
            "database.url",
            config.database.url.clone(),
            &["QUOTEDESK_DATABASE_URL"],
            overrides.database_url.is_some(),
        ),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["QUOTEDESK_DATABASE_MAX_CONNECTIONS"],
            false,
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["QUOTEDESK_DATABASE_TIMEOUT_SECS"],
            false,
        ),
        field(
            "scoring.best_price_bonus",
            scoring.best_price_bonus.to_string(),
            &["QUOTEDESK_SCORING_BEST_PRICE_BONUS"],
            false,
        ),
        field(
            "scoring.confidence_bonus",
            scoring.confidence_bonus.to_string(),
            &["QUOTEDESK_SCORING_CONFIDENCE_BONUS"],
            false,
        ),
        field(
            "scoring.confidence_threshold",
            scoring.confidence_threshold.to_string(),
            &["QUOTEDESK_SCORING_CONFIDENCE_THRESHOLD"],
            false,
        ),
        field(
            "scoring.services_bonus",
            scoring.services_bonus.to_string(),
            &["QUOTEDESK_SCORING_SERVICES_BONUS"],
            false,
        ),
        field(
            "scoring.services_threshold",
            scoring.services_threshold.to_string(),
            &["QUOTEDESK_SCORING_SERVICES_THRESHOLD"],
            false,
        ),
        field(
            "scoring.payment_terms_bonus",
            scoring.payment_terms_bonus.to_string(),
            &["QUOTEDESK_SCORING_PAYMENT_TERMS_BONUS"],
            false,
        ),
        field(
            "scoring.cancellation_bonus",
            scoring.cancellation_bonus.to_string(),
            &["QUOTEDESK_SCORING_CANCELLATION_BONUS"],
            false,
        ),
        field(
            "comparison.min_selected",
            config.comparison.min_selected.to_string(),
            &["QUOTEDESK_COMPARISON_MIN_SELECTED"],
            false,
        ),
        field(
            "comparison.max_selected",
            config.comparison.max_selected.to_string(),
            &["QUOTEDESK_COMPARISON_MAX_SELECTED"],
            false,
        ),
        field(
            "budget.over_budget_policy",
            config.budget.over_budget_policy.as_str().to_string(),
            &["QUOTEDESK_BUDGET_OVER_BUDGET_POLICY"],
            overrides.over_budget_policy.is_some(),
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["QUOTEDESK_LOGGING_LEVEL", "QUOTEDESK_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["QUOTEDESK_LOGGING_FORMAT", "QUOTEDESK_LOG_FORMAT"],
            overrides.log_format.is_some(),
        ),
    ];

    let entries: Vec<ConfigEntry> = fields
        .into_iter()
        .map(|(key, value, env_keys, from_flag)| ConfigEntry {
            key,
            value,
            source: field_source(
                key,
                env_keys,
                from_flag,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: flag > env > file > default)",
        &entries,
    )
}

type Field = (&'static str, String, &'static [&'static str], bool);

fn field(key: &'static str, value: String, env_keys: &'static [&'static str], from_flag: bool) -> Field {
    (key, value, env_keys, from_flag)
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    from_flag: bool,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if from_flag {
        return "flag".to_string();
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
