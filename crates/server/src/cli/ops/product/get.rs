use clap::Args;
use uuid::Uuid;

use common::prelude::Product as ProductRecord;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::get::GetRequest;
use granary_server::http_server::api::v0::product::tree::TreeRequest;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,

    /// Follow the version chain to the current node first
    #[arg(long)]
    pub current: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductGetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
    #[error("version chain of {0} is empty")]
    EmptyChain(Uuid),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = ProductGetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductGetError::NoProductIdentifier);
        };

        let mut product = client.call(GetRequest { id }).await?;
        if self.current && !product.current {
            // History runs oldest first, so the chain head is last
            let chain = client.call(TreeRequest { id }).await?;
            product = chain
                .into_iter()
                .last()
                .ok_or(ProductGetError::EmptyChain(id))?;
        }

        Ok(render(&product))
    }
}

fn render(product: &ProductRecord) -> String {
    let total: u64 = product.sources.iter().map(|s| s.size).sum();
    let mut lines = vec![
        format!(
            "Product: {} v{}{}",
            product.name,
            product.version,
            if product.current { " (current)" } else { "" }
        ),
        format!("  id:          {}", product.id),
        format!("  state:       {}", product.state),
        format!("  owner:       {}", product.owner),
        format!("  uploaded:    {}", product.uploaded.to_rfc3339()),
        format!("  updated:     {}", product.updated.to_rfc3339()),
        format!("  sources:     {} ({} bytes)", product.sources.len(), total),
    ];
    if !product.description.is_empty() {
        lines.insert(1, format!("  description: {}", product.description));
    }
    if let Some(replaces) = product.replaces {
        lines.push(format!("  replaces:    {}", replaces));
    }
    if !product.child_of.is_empty() || !product.parent_of.is_empty() {
        lines.push(format!(
            "  relations:   {} parents, {} children",
            product.child_of.len(),
            product.parent_of.len()
        ));
    }
    if !product.collections.is_empty() {
        lines.push(format!("  collections: {}", product.collections.len()));
    }
    lines.join("\n")
}
