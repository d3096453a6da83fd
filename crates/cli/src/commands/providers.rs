use clap::Args;

use quotedesk_core::config::LoadOptions;

use crate::commands::{execute, CommandResult, ScopeArgs};

#[derive(Debug, Clone, Args)]
pub struct ProvidersArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Lists the category's providers with their requests and quotes, hidden ones left out.
pub fn run(options: LoadOptions, args: ProvidersArgs) -> CommandResult {
    execute("providers", options, move |session| async move {
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;
        let view = workflow.refresh().await?;

        let message = format!(
            "{} provider(s) in {}, {} hidden",
            view.providers.len(),
            workflow.scope().label,
            view.hidden.len()
        );
        Ok(CommandResult::success_with_data("providers", message, &view))
    })
}
