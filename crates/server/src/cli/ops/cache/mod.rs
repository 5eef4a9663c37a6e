use clap::{Args, Subcommand};

pub mod clear;
pub mod evict;
pub mod ls;

use crate::cli::op::Op;

crate::command_enum! {
    (Ls, ls::Ls),
    (Evict, evict::Evict),
    (Clear, clear::Clear),
}

// The macro always names its enum Command; alias it for nesting.
pub type CacheCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Cache {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[async_trait::async_trait]
impl Op for Cache {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
