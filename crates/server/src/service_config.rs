use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use common::prelude::{Grants, ReadPolicy};
use storage::StorageConfig;

/// Server configuration, deserialized from a TOML file. Every field has a
/// workable development default; a bare `granary serve` runs an in-memory
/// catalog against in-memory storage.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port for the API HTTP server (catalog operations).
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Port for the transfer gateway (signed object reads and writes).
    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,

    /// Public base URL signed transfer URLs point at. Defaults to the
    /// gateway port on localhost; set it when clients reach the gateway
    /// through a different host.
    #[serde(default)]
    pub public_url: Option<Url>,

    /// Shared secret for HMAC URL signing. Every server instance minting
    /// or verifying transfer URLs against the same storage must agree.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,

    /// Logical bucket new sources are written under.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Lifetime of signed transfer URLs, in seconds.
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u64,

    /// Path to the sqlite catalog database. In-memory catalog when unset.
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// Object store backend for source bytes.
    #[serde(default)]
    pub storage: StorageConfig,

    /// `world`: reads pass on the read privilege alone; `acl`: reads also
    /// require entity ACL membership.
    #[serde(default)]
    pub read_policy: ReadPolicy,

    /// Group → privilege grants. With no grants configured only the admin
    /// group can do anything.
    #[serde(default)]
    pub grants: Grants,

    /// User names the catalog recognizes when ownership changes hands.
    #[serde(default)]
    pub users: Vec<String>,

    /// Accept any name on ownership transfer instead of consulting `users`.
    #[serde(default)]
    pub open_directory: bool,

    /// Bearer tokens the API resolves to principals.
    #[serde(default)]
    pub tokens: Vec<TokenGrant>,

    /// Principal assumed for requests without an Authorization header.
    /// Unset means such requests are rejected with 401.
    #[serde(default)]
    pub anonymous: Option<PrincipalConfig>,

    /// Log level directive (`error` .. `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for daily-rolling log files; stdout only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Maps one bearer token to a principal.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub user: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalConfig {
    pub user: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

fn default_api_port() -> u16 {
    4401
}

fn default_gateway_port() -> u16 {
    4402
}

fn default_signing_secret() -> String {
    "granary-dev-secret".to_string()
}

fn default_bucket() -> String {
    "granary".to_string()
}

fn default_presign_ttl_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        // serde defaults double as the development defaults
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Base URL minted into signed transfer URLs.
    pub fn public_url(&self) -> Result<Url, ConfigError> {
        match &self.public_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "http://localhost:{}",
                self.gateway_port
            ))?),
        }
    }

    pub fn presign_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.presign_ttl_secs as i64)
    }

    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid URL in config: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_takes_defaults() {
        let config = Config::default();
        assert_eq!(config.api_port, 4401);
        assert_eq!(config.gateway_port, 4402);
        assert_eq!(config.bucket, "granary");
        assert!(config.sqlite_path.is_none());
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn full_config_parses() {
        let raw = r#"
            api_port = 9001
            gateway_port = 9002
            public_url = "https://transfer.example.org"
            signing_secret = "not-for-production"
            read_policy = "acl"
            users = ["ada", "walt"]

            [storage]
            type = "local"
            path = "/tmp/granary-objects"

            [grants.groups]
            users = ["create_product", "read_product", "search"]

            [[tokens]]
            token = "tok-ada"
            user = "ada"
            groups = ["users"]

            [anonymous]
            user = "guest"
            groups = ["guests"]
        "#;
        let config: Config = toml::from_str(raw).unwrap();

        assert_eq!(config.api_port, 9001);
        assert_eq!(config.read_policy, ReadPolicy::Acl);
        assert_eq!(config.tokens.len(), 1);
        assert_eq!(config.tokens[0].user, "ada");
        assert_eq!(config.anonymous.as_ref().unwrap().user, "guest");
        assert_eq!(
            config.public_url().unwrap().as_str(),
            "https://transfer.example.org/"
        );
    }
}
