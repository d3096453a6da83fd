use clap::Args;
use rust_decimal::Decimal;
use serde_json::json;

use quotedesk_core::budget::project_impact;
use quotedesk_core::config::LoadOptions;

use crate::commands::{execute, CommandResult, ScopeArgs};

#[derive(Debug, Clone, Args)]
pub struct ImpactArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, help = "Quote to project")]
    pub quote: String,
    #[arg(long, help = "Total budget of the category")]
    pub total_budget: Decimal,
}

/// Projects the category total if the quote were accepted. Read only.
pub fn run(options: LoadOptions, args: ImpactArgs) -> CommandResult {
    execute("impact", options, move |session| async move {
        let candidate = session.load_quote(&args.scope.category, &args.quote).await?;
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;
        let view = workflow.refresh().await?;

        let impact = project_impact(&view.providers, &candidate, args.total_budget);
        let policy = session.config.budget.over_budget_policy;
        let decision = policy.decide(&impact);

        let message = if impact.is_over_budget {
            format!(
                "accepting {} puts the category {} over budget",
                candidate.id,
                -impact.remaining_budget
            )
        } else {
            format!("accepting {} leaves {} of the budget", candidate.id, impact.remaining_budget)
        };
        let data = json!({ "impact": impact, "decision": decision, "policy": policy.as_str() });
        Ok(CommandResult::success_with_data("impact", message, &data))
    })
}
