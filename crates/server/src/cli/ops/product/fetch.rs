use clap::Args;
use uuid::Uuid;

use common::cache::CacheError;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::files::FilesRequest;
use granary_server::state::{AppState, StateError};

/// Download a product's sources into the local cache, or reuse what a
/// cache tier already holds. Prints one `name -> path` line per source.
#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,

    /// Fetch only this source (defaults to every source)
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductFetchError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
    #[error("product has no source named {0}")]
    UnknownSource(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Fetch {
    type Error = ProductFetchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductFetchError::NoProductIdentifier);
        };

        let mut links = client.call(FilesRequest { id }).await?;
        if let Some(wanted) = &self.source {
            links.retain(|l| l.name == *wanted);
            if links.is_empty() {
                return Err(ProductFetchError::UnknownSource(wanted.clone()));
            }
        }
        if links.is_empty() {
            return Ok("No sources".to_string());
        }

        let state = AppState::load(ctx.config_path.clone())?;
        let cache = state.cache()?;

        let mut lines = Vec::new();
        for link in &links {
            let path = cache.fetch(ctx.client.http_client(), link).await?;
            lines.push(format!("{} -> {}", link.name, path.display()));
        }
        Ok(lines.join("\n"))
    }
}
