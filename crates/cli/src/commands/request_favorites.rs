use std::sync::Arc;

use clap::Args;

use quotedesk_core::audit::{AuditOutcome, TracingAuditSink};
use quotedesk_core::config::LoadOptions;
use quotedesk_core::dispatcher::FavoritesDispatcher;
use quotedesk_core::domain::favorite::FavoriteId;
use quotedesk_db::SqlFavoriteRepository;

use crate::commands::{execute, CommandFailure, CommandResult, ScopeArgs, EXIT_REMOTE};

#[derive(Debug, Clone, Args)]
pub struct RequestFavoritesArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long = "favorite", help = "Favorite id to request a quote from; repeat the flag")]
    pub favorites: Vec<String>,
    #[arg(long, conflicts_with = "favorites", help = "Select every favorite in the category")]
    pub all: bool,
}

/// Sends one quote request per selected favorite provider.
pub fn run(options: LoadOptions, args: RequestFavoritesArgs) -> CommandResult {
    execute("request-favorites", options, move |session| async move {
        let favorites = SqlFavoriteRepository::new(session.pool.clone()).list().await?;
        let dispatcher = FavoritesDispatcher::new(
            session.quote_store(),
            Arc::new(TracingAuditSink),
            args.scope.scope(),
        );

        let selected: Vec<FavoriteId> = if args.all {
            dispatcher.in_scope(&favorites).into_iter().map(|favorite| favorite.id.clone()).collect()
        } else {
            args.favorites.into_iter().map(FavoriteId).collect()
        };

        let summary = dispatcher.request_quotes_for_selected(&selected, &favorites).await?;
        let message = summary.message();
        match summary.audit_outcome() {
            AuditOutcome::Success => {
                Ok(CommandResult::success_with_data("request-favorites", message, &summary))
            }
            AuditOutcome::Failed => {
                Err(CommandFailure::new("remote_operation", message, EXIT_REMOTE).with_data(&summary))
            }
            _ => Ok(CommandResult::partial("request-favorites", message, &summary)),
        }
    })
}
