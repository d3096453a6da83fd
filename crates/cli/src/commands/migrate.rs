use quotedesk_core::config::LoadOptions;
use quotedesk_db::migrations;

use crate::commands::{execute, CommandFailure, CommandResult, EXIT_DATABASE};

pub fn run(options: LoadOptions) -> CommandResult {
    execute("migrate", options, |session| async move {
        let applied = migrations::applied_count(&session.pool)
            .await
            .map_err(|error| CommandFailure::new("db_query", error.to_string(), EXIT_DATABASE))?;
        Ok(CommandResult::success(
            "migrate",
            format!("applied pending migrations ({applied} recorded)"),
        ))
    })
}
