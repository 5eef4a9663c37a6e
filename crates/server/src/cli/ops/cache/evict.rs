use clap::Args;
use uuid::Uuid;

use common::cache::CacheError;
use granary_server::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Evict {
    /// Source file ID, as shown by `cache ls`
    #[arg(long)]
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheEvictError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Evict {
    type Error = CacheEvictError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let cache = state.cache()?;

        if cache.evict(self.id)? {
            Ok(format!("Evicted {}", self.id))
        } else {
            Ok(format!("{} was not cached", self.id))
        }
    }
}
