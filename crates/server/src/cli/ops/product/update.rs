use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::Args;
use uuid::Uuid;

use common::catalog::Revision;
use common::prelude::Metadata;
use common::service::ProductUpdate;
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::get::GetRequest;
use granary_server::http_server::api::v0::product::update::UpdateRequest;

use super::upload::{self, TransferError};

#[derive(Args, Debug, Clone)]
pub struct Update {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,

    /// New name for the replacement version
    #[arg(long)]
    pub rename: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// Metadata JSON document replacing the current one
    #[arg(long)]
    pub metadata: Option<String>,

    /// Hand ownership to another user
    #[arg(long)]
    pub owner: Option<String>,

    /// Local files to attach; same-named sources are replaced, new names
    /// are added
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Source names the new version no longer carries
    #[arg(long = "drop-source")]
    pub drop_sources: Vec<String>,

    /// Split sources larger than this many bytes into multipart transfers
    #[arg(long)]
    pub batch_size: Option<u64>,

    /// Version component to bump: major, minor or patch
    #[arg(long, default_value = "minor", value_parser = parse_level)]
    pub level: Revision,

    #[arg(long = "add-reader")]
    pub add_readers: Vec<String>,

    #[arg(long = "remove-reader")]
    pub remove_readers: Vec<String>,

    #[arg(long = "add-writer")]
    pub add_writers: Vec<String>,

    #[arg(long = "remove-writer")]
    pub remove_writers: Vec<String>,
}

fn parse_level(raw: &str) -> Result<Revision, String> {
    match raw.to_ascii_lowercase().as_str() {
        "major" => Ok(Revision::Major),
        "minor" => Ok(Revision::Minor),
        "patch" => Ok(Revision::Patch),
        other => Err(format!("unknown revision level `{}`", other)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProductUpdateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("malformed metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Update {
    type Error = ProductUpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductUpdateError::NoProductIdentifier);
        };

        // The server applies updates at the chain head; read the node to
        // know which declared files replace existing sources.
        let node = client.call(GetRequest { id }).await?;
        let existing: BTreeSet<&str> = node.sources.iter().map(|s| s.name.as_str()).collect();

        let mut new_sources = Vec::new();
        let mut replace_sources = Vec::new();
        let mut files = BTreeMap::new();
        for path in &self.files {
            let declared = upload::declare(path)?;
            if files.insert(declared.name.clone(), path.clone()).is_some() {
                return Err(TransferError::DuplicateName(declared.name).into());
            }
            if existing.contains(declared.name.as_str()) {
                replace_sources.push(declared);
            } else {
                new_sources.push(declared);
            }
        }

        let metadata = match &self.metadata {
            Some(raw) => Some(serde_json::from_str::<Metadata>(raw)?),
            None => None,
        };

        let update = ProductUpdate {
            name: self.rename.clone(),
            description: self.description.clone(),
            metadata,
            owner: self.owner.clone(),
            new_sources,
            replace_sources,
            drop_sources: self.drop_sources.clone(),
            multipart_batch_size: self.batch_size,
            level: self.level,
            add_readers: self.add_readers.clone(),
            remove_readers: self.remove_readers.clone(),
            add_writers: self.add_writers.clone(),
            remove_writers: self.remove_writers.clone(),
        };

        let created = client.call(UpdateRequest { id, update }).await?;
        let product = if created.upload_urls.is_empty() {
            created.product
        } else {
            upload::push_and_confirm(&mut client, &created.product, &created.upload_urls, &files)
                .await?
        };

        Ok(format!(
            "Updated product {} to v{} ({})\n  state: {}",
            product.name, product.version, product.id, product.state
        ))
    }
}
