use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::tree::TreeRequest;

#[derive(Args, Debug, Clone)]
pub struct Tree {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductTreeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Tree {
    type Error = ProductTreeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductTreeError::NoProductIdentifier);
        };

        let chain = client.call(TreeRequest { id }).await?;
        let output = chain
            .iter()
            .map(|node| {
                format!(
                    "v{}  {}  {}{}",
                    node.version,
                    node.id,
                    node.state,
                    if node.current { "  (current)" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
