use quotedesk_core::config::LoadOptions;
use quotedesk_core::workflow::Confirmation;

use crate::commands::reject::QuoteActionArgs;
use crate::commands::{execute, CommandResult};

/// Moves a rejected quote back to received.
pub fn run(options: LoadOptions, args: QuoteActionArgs) -> CommandResult {
    execute("restore", options, move |session| async move {
        let confirmation = Confirmation::from_flag(args.yes);
        confirmation.require("restore quote")?;

        let quote = session.load_quote(&args.scope.category, &args.quote).await?;
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;
        let outcome = workflow.restore_quote(&quote, confirmation).await?;
        Ok(CommandResult::success_with_data("restore", outcome.message.clone(), &outcome))
    })
}
