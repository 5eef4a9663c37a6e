use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::delete::DeleteRequest;

/// Delete an empty collection. The server refuses while members remain,
/// so remove them first.
#[derive(Args, Debug, Clone)]
pub struct Delete {
    /// Collection ID (or use --name)
    #[arg(long, group = "collection_identifier")]
    pub id: Option<Uuid>,

    /// Collection name (or use --id)
    #[arg(long, group = "collection_identifier")]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionDeleteError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoCollectionIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Delete {
    type Error = CollectionDeleteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve collection name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_collection_name(name).await?
        } else {
            return Err(CollectionDeleteError::NoCollectionIdentifier);
        };

        let response = client.call(DeleteRequest { id }).await?;
        Ok(format!("Deleted collection {}", response.id))
    }
}
