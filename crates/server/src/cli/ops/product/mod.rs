use clap::{Args, Subcommand};

pub mod complete;
pub mod create;
pub mod delete;
pub mod fetch;
pub mod files;
pub mod get;
pub mod link;
pub mod search;
pub mod tree;
pub mod update;
pub mod upload;

use crate::cli::op::Op;
use granary_server::http_server::api::v0::product::search::SearchRequest;

crate::command_enum! {
    (Create, create::Create),
    (Get, get::Get),
    (Update, update::Update),
    (Complete, complete::Complete),
    (Files, files::Files),
    (Fetch, fetch::Fetch),
    (Tree, tree::Tree),
    (Link, link::Link),
    (Search, SearchRequest),
    (Delete, delete::Delete),
}

// The macro always names its enum Command; alias it for nesting.
pub type ProductCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Product {
    #[command(subcommand)]
    pub command: ProductCommand,
}

#[async_trait::async_trait]
impl Op for Product {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
