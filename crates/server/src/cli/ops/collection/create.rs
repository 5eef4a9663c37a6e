use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::create::CreateRequest;

#[derive(Debug, thiserror::Error)]
pub enum CollectionCreateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for CreateRequest {
    type Error = CollectionCreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let collection = client.call(self.clone()).await?;

        Ok(format!(
            "Created collection {} ({})",
            collection.name, collection.id
        ))
    }
}
