use clap::Args;

use quotedesk_core::config::LoadOptions;
use quotedesk_core::workflow::Confirmation;

use crate::commands::{execute, CommandResult, ScopeArgs};

#[derive(Debug, Clone, Args)]
pub struct QuoteActionArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, help = "Quote id")]
    pub quote: String,
    #[arg(long, help = "Confirm the change")]
    pub yes: bool,
}

pub fn run(options: LoadOptions, args: QuoteActionArgs) -> CommandResult {
    execute("reject", options, move |session| async move {
        let confirmation = Confirmation::from_flag(args.yes);
        confirmation.require("reject quote")?;

        let quote = session.load_quote(&args.scope.category, &args.quote).await?;
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;
        let outcome = workflow.reject_quote(&quote, confirmation).await?;
        Ok(CommandResult::success_with_data("reject", outcome.message.clone(), &outcome))
    })
}
