use clap::Args;

use common::cache::CacheError;
use granary_server::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[derive(Debug, thiserror::Error)]
pub enum CacheLsError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = CacheLsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let cache = state.cache()?;

        let entries = cache.entries()?;
        if entries.is_empty() {
            return Ok("Cache is empty".to_string());
        }

        let mut total = 0u64;
        let mut lines = Vec::with_capacity(entries.len() + 1);
        for (id, entry) in &entries {
            total += entry.size;
            lines.push(format!("{}  {}  {} bytes", id, entry.name, entry.size));
        }
        lines.push(format!("{} entries, {} bytes", entries.len(), total));
        Ok(lines.join("\n"))
    }
}
