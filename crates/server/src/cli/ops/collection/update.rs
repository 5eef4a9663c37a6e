use clap::Args;
use uuid::Uuid;

use common::service::CollectionUpdate;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::update::UpdateRequest;

#[derive(Args, Debug, Clone)]
pub struct Update {
    /// Collection ID (or use --name)
    #[arg(long, group = "collection_identifier")]
    pub id: Option<Uuid>,

    /// Collection name (or use --id)
    #[arg(long, group = "collection_identifier")]
    pub name: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long = "add-reader")]
    pub add_readers: Vec<String>,

    #[arg(long = "remove-reader")]
    pub remove_readers: Vec<String>,

    #[arg(long = "add-writer")]
    pub add_writers: Vec<String>,

    #[arg(long = "remove-writer")]
    pub remove_writers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionUpdateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoCollectionIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Update {
    type Error = CollectionUpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve collection name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_collection_name(name).await?
        } else {
            return Err(CollectionUpdateError::NoCollectionIdentifier);
        };

        let update = CollectionUpdate {
            description: self.description.clone(),
            add_readers: self.add_readers.clone(),
            remove_readers: self.remove_readers.clone(),
            add_writers: self.add_writers.clone(),
            remove_writers: self.remove_writers.clone(),
        };
        let collection = client.call(UpdateRequest { id, update }).await?;

        Ok(format!(
            "Updated collection {} ({})",
            collection.name, collection.id
        ))
    }
}
