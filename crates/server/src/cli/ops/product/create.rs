use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use common::prelude::Metadata;
use common::service::NewProduct;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::create::CreateRequest;

use super::upload::{self, TransferError};

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Product name (unique among current versions)
    #[arg(long)]
    pub name: String,

    /// Free-form description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Local files to attach and upload as sources
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Metadata JSON document (defaults to an empty simple document)
    #[arg(long)]
    pub metadata: Option<String>,

    /// Split sources larger than this many bytes into multipart transfers
    #[arg(long)]
    pub batch_size: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductCreateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("malformed metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = ProductCreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Declare every local file up front; names must be unique
        let mut sources = Vec::with_capacity(self.files.len());
        let mut files = BTreeMap::new();
        for path in &self.files {
            let declared = upload::declare(path)?;
            if files.insert(declared.name.clone(), path.clone()).is_some() {
                return Err(TransferError::DuplicateName(declared.name).into());
            }
            sources.push(declared);
        }

        let metadata = match &self.metadata {
            Some(raw) => serde_json::from_str::<Metadata>(raw)?,
            None => Metadata::default(),
        };

        let request = CreateRequest(NewProduct {
            name: self.name.clone(),
            description: self.description.clone(),
            metadata,
            sources,
            multipart_batch_size: self.batch_size,
        });
        let created = client.call(request).await?;

        let product = if created.upload_urls.is_empty() {
            created.product
        } else {
            upload::push_and_confirm(&mut client, &created.product, &created.upload_urls, &files)
                .await?
        };

        Ok(format!(
            "Created product {} v{} ({})\n  state: {}\n  sources: {}",
            product.name,
            product.version,
            product.id,
            product.state,
            product.sources.len()
        ))
    }
}
