use clap::{Args, Subcommand};

pub mod add;
pub mod create;
pub mod delete;
pub mod get;
pub mod link;
pub mod remove;
pub mod search;
pub mod update;

use crate::cli::op::Op;
use granary_server::http_server::api::v0::collection::create::CreateRequest;
use granary_server::http_server::api::v0::collection::search::SearchRequest;

crate::command_enum! {
    (Create, CreateRequest),
    (Get, get::Get),
    (Update, update::Update),
    (Add, add::Add),
    (Remove, remove::Remove),
    (Link, link::Link),
    (Search, SearchRequest),
    (Delete, delete::Delete),
}

// The macro always names its enum Command; alias it for nesting.
pub type CollectionCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Collection {
    #[command(subcommand)]
    pub command: CollectionCommand,
}

#[async_trait::async_trait]
impl Op for Collection {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
