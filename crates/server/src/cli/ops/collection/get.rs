use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::get::GetRequest;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Collection ID (or use --name)
    #[arg(long, group = "collection_identifier")]
    pub id: Option<Uuid>,

    /// Collection name (or use --id)
    #[arg(long, group = "collection_identifier")]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionGetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoCollectionIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = CollectionGetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve collection name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_collection_name(name).await?
        } else {
            return Err(CollectionGetError::NoCollectionIdentifier);
        };

        let view = client.call(GetRequest { id }).await?;
        let collection = &view.collection;

        let mut lines = vec![
            format!("Collection: {}", collection.name),
            format!("  id:    {}", collection.id),
            format!("  owner: {}", collection.owner),
        ];
        if !collection.description.is_empty() {
            lines.insert(1, format!("  description: {}", collection.description));
        }
        if !collection.child_collections.is_empty() || !collection.parent_collections.is_empty() {
            lines.push(format!(
                "  nesting: {} parents, {} children",
                collection.parent_collections.len(),
                collection.child_collections.len()
            ));
        }

        if view.products.is_empty() {
            lines.push("  (no members)".to_string());
        } else {
            lines.push(format!("  members ({}):", view.products.len()));
            for product in &view.products {
                lines.push(format!(
                    "    {}  {}  v{}",
                    product.id, product.name, product.version
                ));
            }
        }
        Ok(lines.join("\n"))
    }
}
