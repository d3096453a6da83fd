use quotedesk_core::config::LoadOptions;
use quotedesk_core::normalize::provider_id;

use crate::commands::delete_provider::ProviderArgs;
use crate::commands::{execute, CommandResult};

pub fn run(options: LoadOptions, args: ProviderArgs) -> CommandResult {
    execute("unhide-provider", options, move |session| async move {
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;

        let id = provider_id(&args.provider);
        let message = if workflow.unhide_provider(&id).await {
            format!("provider {id} is visible again")
        } else {
            format!("provider {id} was not hidden; nothing changed")
        };
        Ok(CommandResult::success_with_data("unhide-provider", message, &workflow.hidden().ids()))
    })
}
