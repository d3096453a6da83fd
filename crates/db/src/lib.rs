pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{PlannerSeedDataset, SeedResult, VerificationResult};
pub use repositories::{
    RepositoryError, SqlFavoriteRepository, SqlHiddenProviderStore, SqlQuoteStore,
};
