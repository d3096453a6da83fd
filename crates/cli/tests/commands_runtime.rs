use std::env;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

use quotedesk_cli::commands::accept::AcceptArgs;
use quotedesk_cli::commands::compare::CompareArgs;
use quotedesk_cli::commands::delete_provider::{DeleteProviderArgs, ProviderArgs};
use quotedesk_cli::commands::impact::ImpactArgs;
use quotedesk_cli::commands::providers::ProvidersArgs;
use quotedesk_cli::commands::reject::QuoteActionArgs;
use quotedesk_cli::commands::request_favorites::RequestFavoritesArgs;
use quotedesk_cli::commands::{
    accept, compare, config, delete_provider, impact, migrate, providers, reject,
    request_favorites, restore, seed, unhide, ScopeArgs,
};
use quotedesk_core::config::{ConfigOverrides, LoadOptions};

const MANAGED_ENV_KEYS: &[&str] = &[
    "QUOTEDESK_DATABASE_URL",
    "QUOTEDESK_DATABASE_MAX_CONNECTIONS",
    "QUOTEDESK_DATABASE_TIMEOUT_SECS",
    "QUOTEDESK_BUDGET_OVER_BUDGET_POLICY",
    "QUOTEDESK_COMPARISON_MIN_SELECTED",
    "QUOTEDESK_COMPARISON_MAX_SELECTED",
    "QUOTEDESK_LOGGING_LEVEL",
    "QUOTEDESK_LOG_LEVEL",
    "QUOTEDESK_LOGGING_FORMAT",
    "QUOTEDESK_LOG_FORMAT",
];

/// Throwaway database file that lives as long as the test.
struct Workspace {
    _dir: TempDir,
    url: String,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("quotedesk.db").display());
        Self { _dir: dir, url }
    }

    fn seeded() -> Self {
        let workspace = Self::new();
        let result = seed::run(workspace.options());
        assert_eq!(result.exit_code, 0, "{}", result.output);
        workspace
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(self.url.clone()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }
}

fn photography() -> ScopeArgs {
    ScopeArgs { category: "fotografia".to_string(), label: Some("Fotografía".to_string()) }
}

fn quote_action(quote: &str, yes: bool) -> QuoteActionArgs {
    QuoteActionArgs { scope: photography(), quote: quote.to_string(), yes }
}

#[test]
fn migrate_returns_success_on_a_fresh_database() {
    with_env(&[], || {
        let workspace = Workspace::new();
        let result = migrate::run(workspace.options());
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn invalid_env_override_returns_config_failure() {
    with_env(&[("QUOTEDESK_BUDGET_OVER_BUDGET_POLICY", "sometimes")], || {
        let workspace = Workspace::new();
        let result = providers::run(workspace.options(), ProvidersArgs { scope: photography() });
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let result = seed::run(workspace.options());
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["data"]["responses"], 3);
        assert_eq!(payload["data"]["favorites"], 3);
    });
}

#[test]
fn config_reports_flag_and_env_sources() {
    with_env(&[("QUOTEDESK_LOG_LEVEL", "debug")], || {
        let workspace = Workspace::new();
        let result = config::run(workspace.options());
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        let entries = payload["data"].as_array().expect("entries");
        let source_of = |key: &str| {
            entries
                .iter()
                .find(|entry| entry["key"] == key)
                .map(|entry| entry["source"].as_str().unwrap_or_default().to_string())
                .expect("config key listed")
        };
        assert_eq!(source_of("database.url"), "flag");
        assert_eq!(source_of("logging.level"), "env (QUOTEDESK_LOG_LEVEL)");
        assert_eq!(source_of("budget.over_budget_policy"), "default");
    });
}

#[test]
fn providers_lists_the_seeded_shortlist() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let result = providers::run(workspace.options(), ProvidersArgs { scope: photography() });
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        let listed = payload["data"]["providers"].as_array().expect("providers");
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().any(|provider| provider["id"] == "foto-lux"));
    });
}

#[test]
fn compare_recommends_the_strongest_offer() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let args = CompareArgs { scope: photography(), quotes: Vec::new() };
        let result = compare::run(workspace.options(), args);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["recommended"], "quote-fotolux-1");
    });
}

#[test]
fn compare_with_one_quote_is_a_validation_failure() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let args =
            CompareArgs { scope: photography(), quotes: vec!["quote-fotolux-1".to_string()] };
        let result = compare::run(workspace.options(), args);
        assert_eq!(result.exit_code, 6, "{}", result.output);
        assert_eq!(parse_payload(&result.output)["error_class"], "validation");
    });
}

#[test]
fn impact_flags_an_over_budget_acceptance() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let args = ImpactArgs {
            scope: photography(),
            quote: "quote-fotolux-1".to_string(),
            total_budget: Decimal::from(1000),
        };
        let result = impact::run(workspace.options(), args);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["impact"]["isOverBudget"], true);
        assert_eq!(payload["data"]["decision"], "proceed_with_warning");
        assert_eq!(payload["data"]["policy"], "warn");
    });
}

#[test]
fn accept_books_the_slot_and_budget_line() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let args = AcceptArgs {
            scope: photography(),
            quote: "quote-fotolux-1".to_string(),
            role: None,
            notes: Some("signed at the studio".to_string()),
            total_budget: None,
            yes: false,
        };
        let result = accept::run(workspace.options(), args);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["outcome"]["quote"]["status"], "accepted");
        assert_eq!(payload["data"]["outcome"]["assignment"]["status"], "completed");
        assert_eq!(payload["data"]["outcome"]["budget"]["status"], "updated");
        assert!(payload["data"]["budgetCheck"].is_null());
    });
}

#[test]
fn accept_is_blocked_over_budget_when_the_policy_says_so() {
    with_env(&[("QUOTEDESK_BUDGET_OVER_BUDGET_POLICY", "block")], || {
        let workspace = Workspace::seeded();
        let args = AcceptArgs {
            scope: photography(),
            quote: "quote-fotolux-1".to_string(),
            role: None,
            notes: None,
            total_budget: Some(Decimal::from(1000)),
            yes: true,
        };
        let result = accept::run(workspace.options(), args);
        assert_eq!(result.exit_code, 6, "{}", result.output);
        assert_eq!(parse_payload(&result.output)["status"], "error");
    });
}

#[test]
fn accept_of_an_unknown_quote_is_not_found() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let args = AcceptArgs {
            scope: photography(),
            quote: "quote-missing".to_string(),
            role: None,
            notes: None,
            total_budget: None,
            yes: false,
        };
        let result = accept::run(workspace.options(), args);
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "not_found");
    });
}

#[test]
fn quote_actions_only_see_quotes_of_their_category() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let video = || ScopeArgs::new("video");

        let rejected = reject::run(
            workspace.options(),
            QuoteActionArgs { scope: video(), quote: "quote-luznorte-1".to_string(), yes: true },
        );
        assert_eq!(rejected.exit_code, 6, "{}", rejected.output);
        assert_eq!(parse_payload(&rejected.output)["error_class"], "not_found");

        let accepted = accept::run(
            workspace.options(),
            AcceptArgs {
                scope: video(),
                quote: "quote-fotolux-1".to_string(),
                role: None,
                notes: None,
                total_budget: None,
                yes: false,
            },
        );
        assert_eq!(accepted.exit_code, 6, "{}", accepted.output);

        let restored = restore::run(workspace.options(), quote_action("quote-luznorte-1", true));
        assert_eq!(restored.exit_code, 0, "{}", restored.output);
        assert_eq!(parse_payload(&restored.output)["data"]["quote"]["status"], "received");
    });
}

#[test]
fn reject_requires_confirmation_then_restore_undoes_it() {
    with_env(&[], || {
        let workspace = Workspace::seeded();

        let declined = reject::run(workspace.options(), quote_action("quote-luznorte-1", false));
        assert_eq!(declined.exit_code, 6, "{}", declined.output);

        let rejected = reject::run(workspace.options(), quote_action("quote-luznorte-1", true));
        assert_eq!(rejected.exit_code, 0, "{}", rejected.output);
        assert_eq!(parse_payload(&rejected.output)["data"]["quote"]["status"], "rejected");

        let restored = restore::run(workspace.options(), quote_action("quote-luznorte-1", true));
        assert_eq!(restored.exit_code, 0, "{}", restored.output);
        assert_eq!(parse_payload(&restored.output)["data"]["quote"]["status"], "received");
    });
}

#[test]
fn delete_provider_hides_it_until_unhidden() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let target = ProviderArgs { scope: photography(), provider: "Luz Norte".to_string() };

        let result = delete_provider::run(
            workspace.options(),
            DeleteProviderArgs { target: target.clone(), yes: true },
        );
        assert_eq!(result.exit_code, 0, "{}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["cancelledRequests"], 1);
        assert_eq!(payload["data"]["rejectedQuotes"], 2);

        let listed = providers::run(workspace.options(), ProvidersArgs { scope: photography() });
        let payload = parse_payload(&listed.output);
        assert_eq!(payload["data"]["providers"].as_array().expect("providers").len(), 2);
        assert_eq!(payload["data"]["hidden"], serde_json::json!(["luz-norte"]));

        let again = delete_provider::run(
            workspace.options(),
            DeleteProviderArgs { target: target.clone(), yes: true },
        );
        assert_eq!(again.exit_code, 6, "hidden providers are not listed");

        let rejected = reject::run(workspace.options(), quote_action("quote-fotolux-1", true));
        assert_eq!(rejected.exit_code, 0, "{}", rejected.output);
        let view = &parse_payload(&rejected.output)["data"]["view"];
        assert_eq!(view["hidden"], serde_json::json!(["luz-norte"]));
        assert!(view["providers"]
            .as_array()
            .expect("providers")
            .iter()
            .all(|provider| provider["id"] != "luz-norte"));

        let shown = unhide::run(workspace.options(), target);
        assert_eq!(shown.exit_code, 0, "{}", shown.output);
        assert_eq!(parse_payload(&shown.output)["data"], serde_json::json!([]));
    });
}

#[test]
fn request_favorites_covers_empty_filtered_and_full_selections() {
    with_env(&[], || {
        let workspace = Workspace::seeded();
        let flores = || ScopeArgs::new("flores");

        let empty = request_favorites::run(
            workspace.options(),
            RequestFavoritesArgs { scope: flores(), favorites: Vec::new(), all: false },
        );
        assert_eq!(empty.exit_code, 6, "{}", empty.output);

        let elsewhere = request_favorites::run(
            workspace.options(),
            RequestFavoritesArgs {
                scope: flores(),
                favorites: vec!["fav-dj-norte".to_string()],
                all: false,
            },
        );
        assert_eq!(elsewhere.exit_code, 6, "{}", elsewhere.output);

        let filtered = request_favorites::run(
            workspace.options(),
            RequestFavoritesArgs {
                scope: flores(),
                favorites: vec!["fav-flores-alba".to_string(), "fav-dj-norte".to_string()],
                all: false,
            },
        );
        assert_eq!(filtered.exit_code, 0, "{}", filtered.output);
        let payload = parse_payload(&filtered.output);
        assert_eq!(payload["data"]["successCount"], 1);
        assert_eq!(payload["data"]["errorCount"], 0);
        assert_eq!(payload["data"]["ignored"], serde_json::json!(["fav-dj-norte"]));

        let all = request_favorites::run(
            workspace.options(),
            RequestFavoritesArgs { scope: flores(), favorites: Vec::new(), all: true },
        );
        assert_eq!(all.exit_code, 0, "{}", all.output);
        assert_eq!(parse_payload(&all.output)["data"]["successCount"], 2);
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    let lock = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let saved = MANAGED_ENV_KEYS
        .iter()
        .map(|key| ((*key).to_string(), env::var(key).ok()))
        .collect::<Vec<_>>();

    for key in MANAGED_ENV_KEYS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test();

    for (key, value) in saved {
        match value {
            Some(value) => env::set_var(&key, value),
            None => env::remove_var(&key),
        }
    }

    drop(lock);
}

fn env_lock() -> &'static Mutex<()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}
