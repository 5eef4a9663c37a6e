mod store;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

pub use store::SqliteCatalogStore;

#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    /// Open (creating if missing) and migrate a catalog database file.
    pub async fn connect(path: &Path) -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Self(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// In-memory database for tests. The single pooled connection is the
    /// database; letting the pool reap it would drop every table.
    pub async fn memory() -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DatabaseSetupError::Unavailable)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Self(pool);
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), DatabaseSetupError> {
        sqlx::migrate!("./migrations")
            .run(&self.0)
            .await
            .map_err(DatabaseSetupError::MigrationFailed)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.0
    }

    pub fn catalog_store(&self) -> SqliteCatalogStore {
        SqliteCatalogStore::new(self.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("error occurred while attempting database migration: {0}")]
    MigrationFailed(sqlx::migrate::MigrateError),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),
}
