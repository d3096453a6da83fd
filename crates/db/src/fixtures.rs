use serde::Serialize;
use sqlx::Executor;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

pub const SEED_CATEGORY: &str = "fotografia";
pub const SEED_CATEGORY_LABEL: &str = "Fotografía";

const SEED_REQUESTS: &[SeededRow] = &[
    SeededRow { id: "req-fotolux-1", status: "quoted" },
    SeededRow { id: "req-fotolux-2", status: "quoted" },
    SeededRow { id: "req-luznorte-1", status: "quoted" },
    SeededRow { id: "req-alba-1", status: "pending" },
];

const SEED_RESPONSES: &[SeededRow] = &[
    SeededRow { id: "quote-fotolux-1", status: "received" },
    SeededRow { id: "quote-luznorte-1", status: "received" },
    SeededRow { id: "quote-luznorte-2", status: "rejected" },
];

const SEED_FAVORITE_IDS: &[&str] = &["fav-flores-alba", "fav-jardin-secreto", "fav-dj-norte"];

const SEED_BUDGET_LINES: &[(&str, &str)] =
    &[("Catering", "8000"), ("Fotografía", "1500"), ("Flores", "600"), ("Música", "1200")];

/// Deterministic planner dataset used by `quotedesk seed` and the end-to-end tests.
///
/// Seeds one photography shortlist with three providers:
/// 1. Foto Lux, two requests and the strongest offer
/// 2. Luz Norte, a full offer plus an older rejected one
/// 3. Estudio Alba, still waiting on a reply
pub struct PlannerSeedDataset;

impl PlannerSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/planner_seed.sql");

    /// Load the dataset. Loading again resets the seeded rows.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        info!(
            event_name = "db.seed.loaded",
            category = SEED_CATEGORY,
            requests = SEED_REQUESTS.len(),
            responses = SEED_RESPONSES.len(),
            "planner seed dataset loaded"
        );

        Ok(SeedResult {
            category: SEED_CATEGORY,
            requests: SEED_REQUESTS.len(),
            responses: SEED_RESPONSES.len(),
            budget_lines: SEED_BUDGET_LINES.len(),
            favorites: SEED_FAVORITE_IDS.len(),
        })
    }

    /// Check that every seeded row is present with its seeded status.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for row in SEED_REQUESTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM quote_request WHERE id = ?1 AND status = ?2 AND category = ?3)",
            )
            .bind(row.id)
            .bind(row.status)
            .bind(SEED_CATEGORY)
            .fetch_one(pool)
            .await?;
            checks.push((row.id, present == 1));
        }

        for row in SEED_RESPONSES {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM quote_response WHERE id = ?1 AND status = ?2 AND category = ?3)",
            )
            .bind(row.id)
            .bind(row.status)
            .bind(SEED_CATEGORY)
            .fetch_one(pool)
            .await?;
            checks.push((row.id, present == 1));
        }

        let favorites: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM favorite WHERE id IN {}",
            sql_array_from_ids(SEED_FAVORITE_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("favorites", favorites == SEED_FAVORITE_IDS.len() as i64));

        let budget: Vec<(String, String)> =
            sqlx::query_as("SELECT name, amount FROM budget_category ORDER BY position ASC")
                .fetch_all(pool)
                .await?;
        let budget_matches = budget.len() == SEED_BUDGET_LINES.len()
            && budget
                .iter()
                .zip(SEED_BUDGET_LINES)
                .all(|((name, amount), (seed_name, seed_amount))| {
                    name.as_str() == *seed_name && amount.as_str() == *seed_amount
                });
        checks.push(("budget-lines", budget_matches));

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded requests, responses and favorites.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let request_ids: Vec<&str> = SEED_REQUESTS.iter().map(|row| row.id).collect();
        let response_ids: Vec<&str> = SEED_RESPONSES.iter().map(|row| row.id).collect();

        let mut tx = pool.begin().await?;
        sqlx::query(&format!(
            "DELETE FROM quote_request WHERE id IN {}",
            sql_array_from_ids(&request_ids)
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "DELETE FROM quote_response WHERE id IN {}",
            sql_array_from_ids(&response_ids)
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "DELETE FROM favorite WHERE id IN {}",
            sql_array_from_ids(SEED_FAVORITE_IDS)
        ))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeededRow {
    id: &'static str,
    status: &'static str,
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug, Serialize)]
pub struct SeedResult {
    pub category: &'static str,
    pub requests: usize,
    pub responses: usize,
    pub budget_lines: usize,
    pub favorites: usize,
}

#[derive(Debug, Serialize)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
