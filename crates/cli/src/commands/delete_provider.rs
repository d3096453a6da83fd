use clap::Args;

use quotedesk_core::config::LoadOptions;
use quotedesk_core::normalize::provider_id;
use quotedesk_core::workflow::{Confirmation, DeleteOutcome};

use crate::commands::{execute, CommandFailure, CommandResult, ScopeArgs, EXIT_REMOTE};

#[derive(Debug, Clone, Args)]
pub struct ProviderArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, help = "Provider name or id, e.g. `Foto Lux` or `foto-lux`")]
    pub provider: String,
}

#[derive(Debug, Clone, Args)]
pub struct DeleteProviderArgs {
    #[command(flatten)]
    pub target: ProviderArgs,
    #[arg(long, help = "Confirm the removal")]
    pub yes: bool,
}

/// Hides the provider, cancels its open requests and rejects its quotes.
pub fn run(options: LoadOptions, args: DeleteProviderArgs) -> CommandResult {
    execute("delete-provider", options, move |session| async move {
        let confirmation = Confirmation::from_flag(args.yes);
        confirmation.require("delete provider")?;

        let mut workflow = session.workflow(args.target.scope.scope());
        workflow.load_hidden().await;
        let view = workflow.refresh().await?;

        let id = provider_id(&args.target.provider);
        let Some(provider) = view.find(&id).cloned() else {
            return Err(CommandFailure::not_found(format!(
                "provider `{}` is not listed in {} (it may already be hidden)",
                args.target.provider,
                workflow.scope().label
            )));
        };

        let report = workflow.delete_provider(&provider, confirmation).await?;
        let message = report.message();
        match report.outcome() {
            DeleteOutcome::Complete => {
                Ok(CommandResult::success_with_data("delete-provider", message, &report))
            }
            DeleteOutcome::Partial => Ok(CommandResult::partial("delete-provider", message, &report)),
            DeleteOutcome::Failed => {
                Err(CommandFailure::new("remote_operation", message, EXIT_REMOTE).with_data(&report))
            }
        }
    })
}
