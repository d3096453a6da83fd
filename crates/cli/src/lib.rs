pub mod commands;
pub mod logging;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use quotedesk_core::budget::OverBudgetPolicy;
use quotedesk_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use commands::accept::AcceptArgs;
use commands::compare::CompareArgs;
use commands::delete_provider::{DeleteProviderArgs, ProviderArgs};
use commands::impact::ImpactArgs;
use commands::providers::ProvidersArgs;
use commands::reject::QuoteActionArgs;
use commands::request_favorites::RequestFavoritesArgs;

#[derive(Debug, Parser)]
#[command(
    name = "quotedesk",
    about = "Quotedesk planner CLI",
    long_about = "Compare supplier quotes per wedding category, accept or reject them, and keep the budget in sync.",
    after_help = "Examples:\n  quotedesk seed\n  quotedesk providers --category fotografia\n  quotedesk compare --category fotografia\n  quotedesk accept --category fotografia --label Fotografía --quote quote-fotolux-1"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a quotedesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the database url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override the log level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, value_parser = parse_log_format, help = "compact|pretty|json")]
    log_format: Option<LogFormat>,
    #[arg(
        long,
        global = true,
        value_parser = parse_policy,
        help = "What to do when an acceptance exceeds the budget (allow|warn|confirm|block)"
    )]
    over_budget_policy: Option<OverBudgetPolicy>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load the deterministic planner dataset (re-running resets it)")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "List the visible providers of a category with their requests and quotes")]
    Providers(ProvidersArgs),
    #[command(about = "Score quotes side by side and name the recommended one")]
    Compare(CompareArgs),
    #[command(about = "Show how accepting a quote would move the category budget")]
    Impact(ImpactArgs),
    #[command(about = "Accept a quote, assign the supplier and update the budget")]
    Accept(AcceptArgs),
    #[command(about = "Mark a quote as rejected")]
    Reject(QuoteActionArgs),
    #[command(about = "Move a rejected quote back to received")]
    Restore(QuoteActionArgs),
    #[command(about = "Hide a provider, cancel its open requests and reject its quotes")]
    DeleteProvider(DeleteProviderArgs),
    #[command(about = "Show a previously hidden provider again")]
    UnhideProvider(ProviderArgs),
    #[command(about = "Send quote requests to selected favorite suppliers")]
    RequestFavorites(RequestFavoritesArgs),
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                over_budget_policy: self.over_budget_policy,
            },
        }
    }
}

fn parse_policy(value: &str) -> Result<OverBudgetPolicy, String> {
    OverBudgetPolicy::parse(value)
        .ok_or_else(|| format!("unknown policy `{value}` (expected allow|warn|confirm|block)"))
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|error: quotedesk_core::config::ConfigError| error.to_string())
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.load_options();

    // A broken config is reported by the command itself.
    if let Ok(config) = AppConfig::load(options.clone()) {
        logging::init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::Providers(args) => commands::providers::run(options, args),
        Command::Compare(args) => commands::compare::run(options, args),
        Command::Impact(args) => commands::impact::run(options, args),
        Command::Accept(args) => commands::accept::run(options, args),
        Command::Reject(args) => commands::reject::run(options, args),
        Command::Restore(args) => commands::restore::run(options, args),
        Command::DeleteProvider(args) => commands::delete_provider::run(options, args),
        Command::UnhideProvider(args) => commands::unhide::run(options, args),
        Command::RequestFavorites(args) => commands::request_favorites::run(options, args),
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", result.output).context("failed to write command output")?;
    Ok(ExitCode::from(result.exit_code))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};
    use quotedesk_core::budget::OverBudgetPolicy;

    #[test]
    fn global_overrides_flow_into_load_options() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "providers",
            "--category",
            "fotografia",
            "--database-url",
            "sqlite://planner.db",
            "--over-budget-policy",
            "block",
        ])
        .expect("parse");

        let options = cli.load_options();
        assert_eq!(options.overrides.database_url.as_deref(), Some("sqlite://planner.db"));
        assert_eq!(options.overrides.over_budget_policy, Some(OverBudgetPolicy::Block));
        assert!(!options.require_file);
        assert!(matches!(cli.command, Command::Providers(_)));
    }

    #[test]
    fn unknown_policy_is_rejected_by_the_parser() {
        let parsed =
            Cli::try_parse_from(["quotedesk", "migrate", "--over-budget-policy", "sometimes"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn favorites_and_all_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "quotedesk",
            "request-favorites",
            "--category",
            "flores",
            "--favorite",
            "fav-flores-alba",
            "--all",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn repeated_quote_flags_are_collected() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "compare",
            "--category",
            "fotografia",
            "--quote",
            "quote-fotolux-1",
            "--quote",
            "quote-luznorte-1",
        ])
        .expect("parse");
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.quotes, vec!["quote-fotolux-1", "quote-luznorte-1"]);
    }
}
