use std::collections::BTreeMap;

use clap::Args;
use uuid::Uuid;

use common::service::{CompleteUpload, PartReceipt};
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::complete::CompleteRequest;
use granary_server::http_server::api::v0::product::confirm::ConfirmRequest;
use granary_server::http_server::api::v0::product::get::GetRequest;

/// Finish an interrupted upload: re-declare the transfer receipts from
/// the recorded source metadata, then complete and confirm the node.
/// Confirmation verifies the stored bytes, so this cannot paper over
/// parts that never arrived.
#[derive(Args, Debug, Clone)]
pub struct Complete {
    /// Product ID (or use --name)
    #[arg(long, group = "product_identifier")]
    pub id: Option<Uuid>,

    /// Product name (or use --id)
    #[arg(long, group = "product_identifier")]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductCompleteError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Either --id or --name must be provided")]
    NoProductIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Complete {
    type Error = ProductCompleteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        // Resolve product name to UUID if needed
        let id = if let Some(id) = self.id {
            id
        } else if let Some(ref name) = self.name {
            client.resolve_product_name(name).await?
        } else {
            return Err(ProductCompleteError::NoProductIdentifier);
        };

        let product = client.call(GetRequest { id }).await?;

        // Receipt sizes follow the server's own batch arithmetic: full
        // batches with the remainder in the last part.
        let mut receipts: BTreeMap<String, Vec<PartReceipt>> = BTreeMap::new();
        for source in &product.sources {
            let parts = u64::from(source.number_of_parts.max(1));
            let batch = source.multipart_batch_size.unwrap_or(source.size);
            let mut sizes = Vec::with_capacity(parts as usize);
            for index in 0..parts {
                let size = if index + 1 == parts {
                    source.size.saturating_sub(batch * (parts - 1))
                } else {
                    batch
                };
                sizes.push(PartReceipt { size, etag: None });
            }
            receipts.insert(source.name.clone(), sizes);
        }

        client
            .call(CompleteRequest {
                id,
                upload: CompleteUpload { receipts },
            })
            .await?;
        let confirmed = client.call(ConfirmRequest { id }).await?;

        Ok(format!(
            "Product {} v{} is {}",
            confirmed.name, confirmed.version, confirmed.state
        ))
    }
}
