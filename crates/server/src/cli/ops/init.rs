use std::path::PathBuf;

use clap::Args;

use granary_server::state::{AppConfig, AppState, CacheTierConfig, StateError};

/// Write `~/.granary` (or `--config-path`) with the remote, token and
/// cache layout taken from the global flags.
#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Shared read-only cache directories to consult before downloading
    #[arg(long = "shared-cache")]
    pub shared_caches: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Init refuses to run on an existing directory, so the resolved
        // remote and token are exactly the command-line flags (or the
        // defaults when absent).
        let config = AppConfig {
            remote: Some(ctx.client.base_url().clone()),
            token: ctx.token.clone(),
            cache_tiers: self
                .shared_caches
                .iter()
                .map(|path| CacheTierConfig {
                    path: path.clone(),
                    writeable: false,
                })
                .collect(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let mut lines = vec![
            format!("Initialized granary directory at {}", state.granary_dir.display()),
            format!("  remote: {}", ctx.client.base_url()),
            format!("  cache:  {}", state.cache_path.display()),
        ];
        for tier in &state.config.cache_tiers {
            lines.push(format!("  shared: {} (read-only)", tier.path.display()));
        }
        Ok(lines.join("\n"))
    }
}
