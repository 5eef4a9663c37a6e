use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::files::FilesRequest;

#[derive(Args, Debug, Clone)]
pub struct Files {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,

    /// Print signed download URLs as well
    #[arg(long)]
    pub urls: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductFilesError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Files {
    type Error = ProductFilesError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductFilesError::NoProductIdentifier);
        };

        let links = client.call(FilesRequest { id }).await?;
        if links.is_empty() {
            return Ok("No sources".to_string());
        }

        let mut lines = Vec::new();
        for link in &links {
            let state = if link.available { "available" } else { "pending" };
            lines.push(format!(
                "{} ({} bytes) [{}] {}",
                link.name, link.size, link.checksum, state
            ));
            if self.urls {
                lines.push(format!("  {}", link.url));
            }
        }
        Ok(lines.join("\n"))
    }
}
