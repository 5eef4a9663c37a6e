use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use common::cache::{CacheError, MultiCache, Tier};

pub const APP_NAME: &str = "granary";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CACHE_DIR_NAME: &str = "cache";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the catalog API (e.g. "http://catalog.example.org:4401")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<Url>,
    /// Bearer token presented on API calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Cache tiers in lookup order. Downloads land in the first writeable
    /// tier; a private tier under the granary directory is appended if the
    /// list has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_tiers: Vec<CacheTierConfig>,
}

/// One cache directory, e.g. a shared read-only lab mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTierConfig {
    pub path: PathBuf,
    #[serde(default = "default_writeable")]
    pub writeable: bool,
}

fn default_writeable() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the granary directory (~/.granary)
    pub granary_dir: PathBuf,
    /// Path to the private cache tier
    pub cache_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the granary directory path (custom or default ~/.granary)
    pub fn granary_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        // Use home directory directly since we want ~/.granary
        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new granary state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let granary_dir = Self::granary_dir(custom_path)?;

        if granary_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&granary_dir)?;

        let cache_path = granary_dir.join(CACHE_DIR_NAME);
        fs::create_dir_all(&cache_path)?;

        // Create config (use provided or default)
        let config = config.unwrap_or_default();
        let config_path = granary_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            granary_dir,
            cache_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the granary directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let granary_dir = Self::granary_dir(custom_path)?;

        if !granary_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let cache_path = granary_dir.join(CACHE_DIR_NAME);
        let config_path = granary_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            granary_dir,
            cache_path,
            config_path,
            config,
        })
    }

    /// Open the tiered cache described by the config. Tiers are opened in
    /// config order; if none is writeable the private tier under the
    /// granary directory is appended so downloads always have a home.
    pub fn cache(&self) -> Result<MultiCache, StateError> {
        let mut tiers = Vec::new();
        for tier in &self.config.cache_tiers {
            tiers.push(Tier::open(&tier.path, tier.writeable)?);
        }
        if !tiers.iter().any(|t| t.writeable()) {
            tiers.push(Tier::open(&self.cache_path, true)?);
        }
        Ok(MultiCache::new(tiers))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("granary directory not initialized. Run 'granary init' first")]
    NotInitialized,

    #[error("granary directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_load_round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("state");

        let config = AppConfig {
            remote: Some(Url::parse("http://catalog.example.org:4401").unwrap()),
            token: Some("sekrit".to_string()),
            cache_tiers: vec![],
        };
        AppState::init(Some(root.clone()), Some(config)).unwrap();

        let loaded = AppState::load(Some(root.clone())).unwrap();
        assert_eq!(
            loaded.config.remote.unwrap().as_str(),
            "http://catalog.example.org:4401/"
        );
        assert_eq!(loaded.config.token.as_deref(), Some("sekrit"));

        // a second init must refuse to clobber
        assert!(matches!(
            AppState::init(Some(root), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn load_without_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            AppState::load(Some(missing)),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn cache_appends_private_tier_when_none_writeable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("state");
        let shared = dir.path().join("shared");
        fs::create_dir_all(&shared).unwrap();

        let config = AppConfig {
            remote: None,
            token: None,
            cache_tiers: vec![CacheTierConfig {
                path: shared,
                writeable: false,
            }],
        };
        let state = AppState::init(Some(root), Some(config)).unwrap();

        let cache = state.cache().unwrap();
        assert_eq!(cache.tiers().len(), 2);
        assert!(!cache.tiers()[0].writeable());
        assert!(cache.tiers()[1].writeable());
    }
}
