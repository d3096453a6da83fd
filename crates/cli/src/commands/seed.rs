use quotedesk_core::config::LoadOptions;
use quotedesk_db::PlannerSeedDataset;

use crate::commands::{execute, CommandFailure, CommandResult, EXIT_DATABASE, EXIT_VALIDATION};

pub fn run(options: LoadOptions) -> CommandResult {
    execute("seed", options, |session| async move {
        let seeded = PlannerSeedDataset::load(&session.pool).await.map_err(|error| {
            CommandFailure::new("seed_execution", error.to_string(), EXIT_DATABASE)
        })?;

        let verification = PlannerSeedDataset::verify(&session.pool).await.map_err(|error| {
            CommandFailure::new("seed_verification", error.to_string(), EXIT_VALIDATION)
        })?;

        if !verification.all_present {
            return Err(CommandFailure::new(
                "seed_verification",
                verification_message(&verification.checks),
                EXIT_VALIDATION,
            ));
        }

        let message = format!(
            "planner seed loaded for `{}`: {} request(s), {} quote(s), {} budget line(s), {} favorite(s)",
            seeded.category, seeded.requests, seeded.responses, seeded.budget_lines, seeded.favorites
        );
        Ok(CommandResult::success_with_data("seed", message, &seeded))
    })
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("req-fotolux-1", true), ("quote-luznorte-2", false), ("budget-lines", false)];

        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for checks: quote-luznorte-2, budget-lines"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("favorites", true)];
        assert_eq!(verification_message(&checks), "Some seed data failed to load");
    }
}
