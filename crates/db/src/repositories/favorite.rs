use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use quotedesk_core::domain::favorite::{Favorite, FavoriteId, FavoriteSupplier};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlFavoriteRepository {
    pool: DbPool,
}

impl SqlFavoriteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Favorite>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT id, supplier_id, supplier_slug, name, email, category, service
             FROM favorite ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_favorite).collect()
    }

    pub async fn save(&self, favorite: &Favorite) -> Result<(), RepositoryError> {
        let supplier = &favorite.supplier;
        sqlx::query(
            "INSERT INTO favorite (id, supplier_id, supplier_slug, name, email, category, service,
                                   created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 supplier_id = excluded.supplier_id,
                 supplier_slug = excluded.supplier_slug,
                 name = excluded.name,
                 email = excluded.email,
                 category = excluded.category,
                 service = excluded.service",
        )
        .bind(&favorite.id.0)
        .bind(&supplier.id)
        .bind(&supplier.slug)
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.category)
        .bind(&supplier.service)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_favorite(row: &SqliteRow) -> Result<Favorite, RepositoryError> {
    Ok(Favorite {
        id: FavoriteId(row.try_get("id")?),
        supplier: FavoriteSupplier {
            id: row.try_get("supplier_id")?,
            slug: row.try_get("supplier_slug")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            category: row.try_get("category")?,
            service: row.try_get("service")?,
        },
    })
}
