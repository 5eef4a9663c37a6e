use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::remove::RemoveRequest;

#[derive(Args, Debug, Clone)]
pub struct Remove {
    /// Collection ID (or use --collection-name)
    #[arg(long, group = "collection_identifier")]
    pub collection_id: Option<Uuid>,

    /// Collection name (or use --collection-id)
    #[arg(long, group = "collection_identifier")]
    pub collection_name: Option<String>,

    /// Product ID (or use --product-name)
    #[arg(long, group = "product_identifier")]
    pub product_id: Option<Uuid>,

    /// Product name (or use --product-id)
    #[arg(long, group = "product_identifier")]
    pub product_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionRemoveError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --collection-id or --collection-name must be provided")]
    NoCollectionIdentifier,
    #[error("Either --product-id or --product-name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Remove {
    type Error = CollectionRemoveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let collection = if let Some(id) = self.collection_id {
            id
        } else if let Some(ref name) = self.collection_name {
            client.resolve_collection_name(name).await?
        } else {
            return Err(CollectionRemoveError::NoCollectionIdentifier);
        };

        let product = if let Some(id) = self.product_id {
            id
        } else if let Some(ref name) = self.product_name {
            client.resolve_product_name(name).await?
        } else {
            return Err(CollectionRemoveError::NoProductIdentifier);
        };

        let response = client.call(RemoveRequest { collection, product }).await?;

        Ok(format!(
            "Removed product {} from collection {}",
            response.product, response.collection
        ))
    }
}
