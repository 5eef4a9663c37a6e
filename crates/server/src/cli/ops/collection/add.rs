use clap::Args;
use uuid::Uuid;

use common::prelude::CollectionPolicy;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::add::AddRequest;

#[derive(Args, Debug, Clone)]
pub struct Add {
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

    /// Membership policy: all, new, current or fixed
    #[arg(long, default_value = "all")]
    pub policy: CollectionPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionAddError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --collection-id or --collection-name must be provided")]
    NoCollectionIdentifier,
    #[error("Either --product-id or --product-name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Add {
    type Error = CollectionAddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let collection = if let Some(id) = self.collection_id {
            id
        } else if let Some(ref name) = self.collection_name {
            client.resolve_collection_name(name).await?
        } else {
            return Err(CollectionAddError::NoCollectionIdentifier);
        };

        let product = if let Some(id) = self.product_id {
            id
        } else if let Some(ref name) = self.product_name {
            client.resolve_product_name(name).await?
        } else {
            return Err(CollectionAddError::NoProductIdentifier);
        };

        let response = client
            .call(AddRequest {
                collection,
                product,
                policy: self.policy,
            })
            .await?;

        Ok(format!(
            "Added product {} to collection {} with policy {}",
            response.product, response.collection, response.policy
        ))
    }
}
