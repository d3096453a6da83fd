use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use quotedesk_core::errors::{RemoteOperation, RemoteOperationError};

pub mod favorite;
pub mod hidden;
pub mod quote_store;

pub use favorite::SqlFavoriteRepository;
pub use hidden::SqlHiddenProviderStore;
pub use quote_store::SqlQuoteStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    /// Folds a storage failure into the error the workflow understands.
    pub fn into_remote(self, operation: RemoteOperation) -> RemoteOperationError {
        match self {
            Self::NotFound(id) => RemoteOperationError::not_found(operation, id),
            other => RemoteOperationError::failed(operation, other.to_string()),
        }
    }
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim()).map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_optional_decimal(
    column: &str,
    value: Option<String>,
) -> Result<Option<Decimal>, RepositoryError> {
    value.map(|amount| parse_decimal(column, amount)).transpose()
}
