use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use common::prelude::{Catalog, CatalogStore, MemoryCatalogStore, Principal};
use common::access::StaticDirectory;
use common::service::CatalogOptions;
use storage::{Storage, UrlSigner};

use crate::database::{Database, DatabaseSetupError};
use crate::service_config::{Config, ConfigError};

/// Shared service state handed to every HTTP handler.
#[derive(Clone)]
pub struct State {
    catalog: Catalog,
    auth: Arc<TokenAuthority>,
    database: Option<Database>,
    started_at: DateTime<Utc>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateError> {
        let storage = Storage::from_config(&config.storage)?;
        let signer = UrlSigner::new(config.public_url()?, config.signing_secret.as_bytes());

        let (store, database): (Arc<dyn CatalogStore>, Option<Database>) =
            match &config.sqlite_path {
                Some(path) => {
                    let database = Database::connect(path).await?;
                    (Arc::new(database.catalog_store()), Some(database))
                }
                None => (Arc::new(MemoryCatalogStore::new()), None),
            };

        let directory = if config.open_directory {
            StaticDirectory::open()
        } else {
            // Token-bearing users are always known to the directory.
            StaticDirectory::from_users(
                config
                    .users
                    .iter()
                    .cloned()
                    .chain(config.tokens.iter().map(|t| t.user.clone())),
            )
        };

        let options = CatalogOptions {
            bucket: config.bucket.clone(),
            presign_ttl: config.presign_ttl(),
            read_policy: config.read_policy,
        };

        let catalog = Catalog::new(
            store,
            storage,
            signer,
            Arc::new(directory),
            config.grants.clone(),
            options,
        );

        Ok(Self {
            catalog,
            auth: Arc::new(TokenAuthority::from_config(config)),
            database,
            started_at: Utc::now(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn auth(&self) -> &TokenAuthority {
        &self.auth
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Cheap dependency probe for the readiness endpoint.
    pub async fn is_ready(&self) -> bool {
        match &self.database {
            Some(db) => sqlx::query("SELECT 1").execute(db.pool()).await.is_ok(),
            None => true,
        }
    }
}

/// Resolves bearer tokens to principals from the static token table.
#[derive(Debug, Default)]
pub struct TokenAuthority {
    tokens: HashMap<String, Principal>,
    anonymous: Option<Principal>,
}

impl TokenAuthority {
    pub fn from_config(config: &Config) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|grant| {
                (
                    grant.token.clone(),
                    Principal::new(grant.user.clone(), grant.groups.clone()),
                )
            })
            .collect();
        let anonymous = config
            .anonymous
            .as_ref()
            .map(|p| Principal::new(p.user.clone(), p.groups.clone()));
        Self { tokens, anonymous }
    }

    pub fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).cloned()
    }

    /// The principal for requests presenting no token, when configured.
    pub fn anonymous(&self) -> Option<Principal> {
        self.anonymous.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage setup failed: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("database setup failed: {0}")]
    Database(#[from] DatabaseSetupError),
}
