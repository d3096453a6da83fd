pub mod accept;
pub mod compare;
pub mod config;
pub mod delete_provider;
pub mod impact;
pub mod migrate;
pub mod providers;
pub mod reject;
pub mod request_favorites;
pub mod restore;
pub mod seed;
pub mod unhide;

use std::future::Future;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use quotedesk_core::audit::TracingAuditSink;
use quotedesk_core::config::{AppConfig, LoadOptions};
use quotedesk_core::domain::quote::{QuoteId, QuoteResponse};
use quotedesk_core::errors::{ValidationError, WorkflowError};
use quotedesk_core::workflow::{AcceptanceWorkflow, CategoryScope};
use quotedesk_db::{
    connect_with_config, migrations, DbPool, RepositoryError, SqlHiddenProviderStore,
    SqlQuoteStore,
};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DATABASE: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_VALIDATION: u8 = 6;
pub const EXIT_REMOTE: u8 = 7;
pub const EXIT_PARTIAL: u8 = 8;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::render(command, "ok", None, message.into(), None, EXIT_OK)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        Self::render(command, "ok", None, message.into(), to_data(data), EXIT_OK)
    }

    /// Some steps of the action went through and some did not.
    pub fn partial(command: &str, message: impl Into<String>, data: &impl Serialize) -> Self {
        Self::render(
            command,
            "partial",
            Some("partial_failure"),
            message.into(),
            to_data(data),
            EXIT_PARTIAL,
        )
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::render(command, "error", Some(error_class), message.into(), None, exit_code)
    }

    fn render(
        command: &str,
        status: &str,
        error_class: Option<&str>,
        message: String,
        data: Option<Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class: error_class.map(str::to_string),
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn to_data(data: &impl Serialize) -> Option<Value> {
    serde_json::to_value(data).ok()
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Why a command stopped, already mapped to its machine class and exit code.
#[derive(Debug)]
pub struct CommandFailure {
    pub error_class: &'static str,
    pub message: String,
    pub exit_code: u8,
    data: Option<Value>,
}

impl CommandFailure {
    pub fn new(error_class: &'static str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { error_class, message: message.into(), exit_code, data: None }
    }

    pub fn with_data(mut self, data: &impl Serialize) -> Self {
        self.data = to_data(data);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation", message, EXIT_VALIDATION)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message, EXIT_VALIDATION)
    }

    fn into_result(self, command: &str) -> CommandResult {
        CommandResult::render(
            command,
            "error",
            Some(self.error_class),
            self.message,
            self.data,
            self.exit_code,
        )
    }
}

impl From<WorkflowError> for CommandFailure {
    fn from(error: WorkflowError) -> Self {
        let exit_code = match error {
            WorkflowError::Remote(_) => EXIT_REMOTE,
            WorkflowError::Validation(_) | WorkflowError::Domain(_) => EXIT_VALIDATION,
        };
        Self::new(error.error_class(), format!("{} ({error})", error.user_message()), exit_code)
    }
}

impl From<ValidationError> for CommandFailure {
    fn from(error: ValidationError) -> Self {
        WorkflowError::from(error).into()
    }
}

impl From<RepositoryError> for CommandFailure {
    fn from(error: RepositoryError) -> Self {
        Self::new("db_query", error.to_string(), EXIT_DATABASE)
    }
}

/// Category flags shared by every planner command.
#[derive(Debug, Clone, Args)]
pub struct ScopeArgs {
    #[arg(long, help = "Category key, e.g. `fotografia`")]
    pub category: String,
    #[arg(long, help = "Display name of the category; defaults to the key")]
    pub label: Option<String>,
}

impl ScopeArgs {
    pub fn new(category: impl Into<String>) -> Self {
        Self { category: category.into(), label: None }
    }

    pub fn scope(&self) -> CategoryScope {
        match &self.label {
            Some(label) => CategoryScope::new(self.category.clone(), label.clone()),
            None => CategoryScope::from_category(self.category.clone()),
        }
    }
}

pub(crate) type SqlWorkflow =
    AcceptanceWorkflow<SqlQuoteStore, SqlHiddenProviderStore, TracingAuditSink>;

/// Loaded config plus a migrated pool, handed to each command body.
pub(crate) struct Session {
    pub config: AppConfig,
    pub pool: DbPool,
}

impl Session {
    pub fn quote_store(&self) -> Arc<SqlQuoteStore> {
        Arc::new(SqlQuoteStore::new(self.pool.clone()))
    }

    pub fn workflow(&self, scope: CategoryScope) -> SqlWorkflow {
        AcceptanceWorkflow::new(
            self.quote_store(),
            Arc::new(SqlHiddenProviderStore::new(self.pool.clone())),
            Arc::new(TracingAuditSink),
            scope,
        )
        .with_budget_policy(self.config.budget.over_budget_policy)
        .with_correlation_id(Uuid::new_v4().to_string())
    }

    /// Loads a quote of `category`. Quotes filed under another category are reported as missing.
    pub async fn load_quote(
        &self,
        category: &str,
        quote_id: &str,
    ) -> Result<QuoteResponse, CommandFailure> {
        if quote_id.trim().is_empty() {
            return Err(ValidationError::MissingQuoteId.into());
        }
        SqlQuoteStore::new(self.pool.clone())
            .find_response_in(category, &QuoteId(quote_id.to_string()))
            .await?
            .ok_or_else(|| {
                CommandFailure::not_found(format!("quote `{quote_id}` was not found in {category}"))
            })
    }
}

/// Loads config, connects, applies pending migrations, then runs `action`.
pub(crate) fn execute<F, Fut>(command: &'static str, options: LoadOptions, action: F) -> CommandResult
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Result<CommandResult, CommandFailure>>,
{
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database).await.map_err(|error| {
            CommandFailure::new("db_connectivity", error.to_string(), EXIT_DATABASE)
        })?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error.to_string(), EXIT_MIGRATION))?;

        let outcome = action(Session { config, pool: pool.clone() }).await;
        pool.close().await;
        outcome
    });

    result.unwrap_or_else(|failure| failure.into_result(command))
}
