use clap::Args;
use serde_json::json;

use quotedesk_core::config::LoadOptions;
use quotedesk_core::domain::quote::{QuoteId, QuoteResponse};
use quotedesk_core::scoring::{recommended, ComparisonSet, QuoteScorer};

use crate::commands::{execute, CommandFailure, CommandResult, ScopeArgs};

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long = "quote", help = "Quote id to compare; repeat the flag. Defaults to the first visible quotes")]
    pub quotes: Vec<String>,
}

pub fn run(options: LoadOptions, args: CompareArgs) -> CommandResult {
    execute("compare", options, move |session| async move {
        let mut workflow = session.workflow(args.scope.scope());
        workflow.load_hidden().await;
        let view = workflow.refresh().await?;

        let quotes: Vec<QuoteResponse> =
            view.all_quotes().into_iter().map(|entry| entry.quote).collect();
        let limits = session.config.comparison;
        let selection = if args.quotes.is_empty() {
            ComparisonSet::new(&quotes, limits)
        } else {
            ComparisonSet::from_ids(args.quotes.into_iter().map(QuoteId).collect(), limits)
        };

        let candidates = selection.candidates(&quotes);
        if candidates.len() < limits.min_selected {
            return Err(CommandFailure::validation(format!(
                "at least {} visible quotes are needed to compare, found {}",
                limits.min_selected,
                candidates.len()
            )));
        }

        let scored = QuoteScorer::with_rules(session.config.scoring).score(&candidates);
        let best = recommended(&scored);
        let message = match best {
            Some(best) => format!(
                "compared {} quote(s); recommended {} from {} ({} points)",
                scored.len(),
                best.quote.id,
                best.quote.supplier_name,
                best.score
            ),
            None => format!("compared {} quote(s)", scored.len()),
        };

        let data = json!({
            "quotes": scored,
            "recommended": best.map(|best| best.quote.id.clone()),
            "bestPrice": QuoteScorer::best_price(&candidates),
        });
        Ok(CommandResult::success_with_data("compare", message, &data))
    })
}
