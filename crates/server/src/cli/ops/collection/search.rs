use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::collection::search::SearchRequest;

#[derive(Debug, thiserror::Error)]
pub enum CollectionSearchError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SearchRequest {
    type Error = CollectionSearchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response = client.call(self.clone()).await?;

        if response.collections.is_empty() {
            return Ok("No collections found".to_string());
        }
        let output = response
            .collections
            .iter()
            .map(|c| format!("{}  {}  (owner {})", c.id, c.name, c.owner))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
