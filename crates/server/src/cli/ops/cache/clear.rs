use clap::Args;

use common::cache::CacheError;
use granary_server::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Clear;

#[derive(Debug, thiserror::Error)]
pub enum CacheClearError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Clear {
    type Error = CacheClearError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let cache = state.cache()?;

        let removed = cache.clear()?;
        Ok(format!("Removed {} cached file(s)", removed))
    }
}
