use sqlx::Row;

use quotedesk_core::domain::provider::ProviderId;
use quotedesk_core::errors::{RemoteOperation, RemoteOperationError};
use quotedesk_core::hidden::HiddenProviderStore;

use super::RepositoryError;
use crate::DbPool;

pub struct SqlHiddenProviderStore {
    pool: DbPool,
}

impl SqlHiddenProviderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ids(&self, key: &str) -> Result<Vec<ProviderId>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT provider_id FROM hidden_provider WHERE storage_key = ? ORDER BY position ASC",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("provider_id").map(ProviderId).map_err(Into::into))
            .collect()
    }

    /// Replaces the stored list under `key` in one transaction.
    pub async fn replace(&self, key: &str, ids: &[ProviderId]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM hidden_provider WHERE storage_key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        for (position, id) in ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO hidden_provider (storage_key, provider_id, position) VALUES (?, ?, ?)
                 ON CONFLICT(storage_key, provider_id) DO NOTHING",
            )
            .bind(key)
            .bind(&id.0)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl HiddenProviderStore for SqlHiddenProviderStore {
    async fn load(&self, key: &str) -> Result<Vec<ProviderId>, RemoteOperationError> {
        self.ids(key).await.map_err(|error| error.into_remote(RemoteOperation::LoadHiddenProviders))
    }

    async fn save(&self, key: &str, ids: &[ProviderId]) -> Result<(), RemoteOperationError> {
        self.replace(key, ids)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::SaveHiddenProviders))
    }
}
