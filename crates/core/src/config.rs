use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::OverBudgetPolicy;
use crate::scoring::{ComparisonLimits, ScoringRules};

pub const DEFAULT_CONFIG_FILE: &str = "quotedesk.toml";

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scoring: ScoringRules,
    pub comparison: ComparisonLimits,
    pub budget: BudgetConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BudgetConfig {
    pub over_budget_policy: OverBudgetPolicy,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub over_budget_policy: Option<OverBudgetPolicy>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://quotedesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            scoring: ScoringRules::default(),
            comparison: ComparisonLimits::default(),
            budget: BudgetConfig { over_budget_policy: OverBudgetPolicy::default() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(scoring) = patch.scoring {
            let rules = &mut self.scoring;
            if let Some(value) = scoring.best_price_bonus {
                rules.best_price_bonus = value;
            }
            if let Some(value) = scoring.confidence_bonus {
                rules.confidence_bonus = value;
            }
            if let Some(value) = scoring.confidence_threshold {
                rules.confidence_threshold = value;
            }
            if let Some(value) = scoring.services_bonus {
                rules.services_bonus = value;
            }
            if let Some(value) = scoring.services_threshold {
                rules.services_threshold = value;
            }
            if let Some(value) = scoring.payment_terms_bonus {
                rules.payment_terms_bonus = value;
            }
            if let Some(value) = scoring.cancellation_bonus {
                rules.cancellation_bonus = value;
            }
        }

        if let Some(comparison) = patch.comparison {
            if let Some(min_selected) = comparison.min_selected {
                self.comparison.min_selected = min_selected;
            }
            if let Some(max_selected) = comparison.max_selected {
                self.comparison.max_selected = max_selected;
            }
        }

        if let Some(budget) = patch.budget {
            if let Some(policy) = budget.over_budget_policy {
                self.budget.over_budget_policy = policy;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTEDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("QUOTEDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("QUOTEDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("QUOTEDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("QUOTEDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let rules = &mut self.scoring;
        for (key, slot) in [
            ("QUOTEDESK_SCORING_BEST_PRICE_BONUS", &mut rules.best_price_bonus),
            ("QUOTEDESK_SCORING_CONFIDENCE_BONUS", &mut rules.confidence_bonus),
            ("QUOTEDESK_SCORING_CONFIDENCE_THRESHOLD", &mut rules.confidence_threshold),
            ("QUOTEDESK_SCORING_SERVICES_BONUS", &mut rules.services_bonus),
            ("QUOTEDESK_SCORING_PAYMENT_TERMS_BONUS", &mut rules.payment_terms_bonus),
            ("QUOTEDESK_SCORING_CANCELLATION_BONUS", &mut rules.cancellation_bonus),
        ] {
            if let Some(value) = read_env(key) {
                *slot = parse_env(key, &value)?;
            }
        }
        if let Some(value) = read_env("QUOTEDESK_SCORING_SERVICES_THRESHOLD") {
            rules.services_threshold = parse_env("QUOTEDESK_SCORING_SERVICES_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("QUOTEDESK_COMPARISON_MIN_SELECTED") {
            self.comparison.min_selected = parse_env("QUOTEDESK_COMPARISON_MIN_SELECTED", &value)?;
        }
        if let Some(value) = read_env("QUOTEDESK_COMPARISON_MAX_SELECTED") {
            self.comparison.max_selected = parse_env("QUOTEDESK_COMPARISON_MAX_SELECTED", &value)?;
        }

        if let Some(value) = read_env("QUOTEDESK_BUDGET_OVER_BUDGET_POLICY") {
            self.budget.over_budget_policy = OverBudgetPolicy::parse(&value).ok_or_else(|| {
                ConfigError::InvalidEnvOverride {
                    key: "QUOTEDESK_BUDGET_OVER_BUDGET_POLICY".to_string(),
                    value: value.clone(),
                }
            })?;
        }

        let log_level =
            read_env("QUOTEDESK_LOGGING_LEVEL").or_else(|| read_env("QUOTEDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEDESK_LOGGING_FORMAT").or_else(|| read_env("QUOTEDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(policy) = overrides.over_budget_policy {
            self.budget.over_budget_policy = policy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_scoring(&self.scoring)?;
        validate_comparison(&self.comparison)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces `${VAR}` with the value of `VAR`. A missing variable is an error.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_scoring(scoring: &ScoringRules) -> Result<(), ConfigError> {
    if scoring.confidence_threshold > 100 {
        return Err(ConfigError::Validation(
            "scoring.confidence_threshold must be in range 0..=100".to_string(),
        ));
    }

    if scoring.services_threshold == 0 {
        return Err(ConfigError::Validation(
            "scoring.services_threshold must be greater than zero".to_string(),
        ));
    }

    if scoring.max_total() == 0 {
        return Err(ConfigError::Validation(
            "scoring bonuses are all zero; at least one rule must award points".to_string(),
        ));
    }

    Ok(())
}

fn validate_comparison(comparison: &ComparisonLimits) -> Result<(), ConfigError> {
    if comparison.min_selected == 0 {
        return Err(ConfigError::Validation(
            "comparison.min_selected must be greater than zero".to_string(),
        ));
    }

    if comparison.max_selected < comparison.min_selected {
        return Err(ConfigError::Validation(format!(
            "comparison.max_selected ({}) must not be below comparison.min_selected ({})",
            comparison.max_selected, comparison.min_selected
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    scoring: Option<ScoringPatch>,
    comparison: Option<ComparisonPatch>,
    budget: Option<BudgetPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    best_price_bonus: Option<u8>,
    confidence_bonus: Option<u8>,
    confidence_threshold: Option<u8>,
    services_bonus: Option<u8>,
    services_threshold: Option<usize>,
    payment_terms_bonus: Option<u8>,
    cancellation_bonus: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ComparisonPatch {
    min_selected: Option<usize>,
    max_selected: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct BudgetPatch {
    over_budget_policy: Option<OverBudgetPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
