use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::search::SearchRequest;

#[derive(Debug, thiserror::Error)]
pub enum ProductSearchError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SearchRequest {
    type Error = ProductSearchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response = client.call(self.clone()).await?;

        if response.products.is_empty() {
            return Ok("No products found".to_string());
        }
        let output = response
            .products
            .iter()
            .map(|p| format!("{}  {}  v{}  [{}]", p.id, p.name, p.version, p.state))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
