use clap::Args;
use uuid::Uuid;

use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::link::LinkRequest;
use granary_server::http_server::api::v0::collection::unlink::UnlinkRequest;

#[derive(Args, Debug, Clone)]
pub struct Link {
    /// Parent collection ID
    #[arg(long)]
    pub parent: Uuid,

    /// Child collection ID
    #[arg(long)]
    pub child: Uuid,

    /// Remove the nesting instead of adding it
    #[arg(long)]
    pub remove: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionLinkError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Link {
    type Error = CollectionLinkError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        if self.remove {
            let response = client
                .call(UnlinkRequest {
                    parent: self.parent,
                    child: self.child,
                })
                .await?;
            Ok(format!(
                "Unlinked collection {} -> {}",
                response.parent, response.child
            ))
        } else {
            let response = client
                .call(LinkRequest {
                    parent: self.parent,
                    child: self.child,
                })
                .await?;
            Ok(format!(
                "Linked collection {} -> {}",
                response.parent, response.child
            ))
        }
    }
}
