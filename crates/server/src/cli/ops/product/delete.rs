use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::delete::DeleteRequest;
use granary_server::http_server::api::v0::product::delete_tree::DeleteTreeRequest;

#[derive(Args, Debug, Clone)]
pub struct Delete {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,

    /// Also delete the stored source bytes
    #[arg(long)]
    pub data: bool,

    /// Delete the whole version chain, not just this node
    #[arg(long)]
    pub tree: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductDeleteError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Delete {
    type Error = ProductDeleteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductDeleteError::NoProductIdentifier);
        };

        if self.tree {
            let response = client
                .call(DeleteTreeRequest {
                    id,
                    data: self.data,
                })
                .await?;
            Ok(format!("Deleted {} version(s)", response.deleted))
        } else {
            client
                .call(DeleteRequest {
                    id,
                    data: self.data,
                })
                .await?;
            Ok(format!("Deleted product {}", id))
        }
    }
}
