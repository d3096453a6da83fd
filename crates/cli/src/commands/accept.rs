use clap::Args;
use rust_decimal::Decimal;
use serde_json::json;

use quotedesk_core::config::LoadOptions;
use quotedesk_core::workflow::Confirmation;

use crate::commands::{execute, CommandResult, ScopeArgs};

#[derive(Debug, Clone, Args)]
pub struct AcceptArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, help = "Quote to accept")]
    pub quote: String,
    #[arg(long, help = "Service slot to book; defaults to the category label")]
    pub role: Option<String>,
    #[arg(long, help = "Notes stored with the booking")]
    pub notes: Option<String>,
    #[arg(long, help = "Check the category budget against this total before accepting")]
    pub total_budget: Option<Decimal>,
    #[arg(long, help = "Confirm an over-budget acceptance when the policy asks for it")]
    pub yes: bool,
}

pub fn run(options: LoadOptions, args: AcceptArgs) -> CommandResult {
    execute("accept", options, move |session| async move {
        let quote = session.load_quote(&args.scope.category, &args.quote).await?;
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;

        let budget_check = match args.total_budget {
            Some(total) => {
                Some(workflow.check_budget(&quote, total, Confirmation::from_flag(args.yes)).await?)
            }
            None => None,
        };

        let role = args.role.unwrap_or_else(|| workflow.scope().label.clone());
        let outcome = workflow.accept_quote(&quote, &role, args.notes.as_deref()).await?;

        let failures = outcome.follow_up_failures();
        let data = json!({ "outcome": &outcome, "budgetCheck": budget_check });
        if failures.is_empty() {
            Ok(CommandResult::success_with_data("accept", outcome.message.clone(), &data))
        } else {
            let message = format!("{} Follow-up steps failed: {}", outcome.message, failures.join("; "));
            Ok(CommandResult::partial("accept", message, &data))
        }
    })
}
