use std::time::Duration;

use clap::Args;
use serde::Deserialize;

use granary_server::version::build_info;

const SERVER_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Print the client build, plus the server build when the remote answers.
#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Skip the server round trip and report only the client build
    #[arg(long)]
    pub client_only: bool,
}

/// Owned mirror of the `/_status/version` payload.
#[derive(Debug, Deserialize)]
struct ServerBuild {
    version: String,
    build_profile: String,
    build_timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {}

#[async_trait::async_trait]
impl crate::cli::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = format!("client: {}", build_info());
        if self.client_only {
            return Ok(client);
        }

        // An offline remote is an answer, not a failure.
        let server = match fetch_server_build(ctx).await {
            Some(build) => format!(
                "server: {} ({}, built {})",
                build.version, build.build_profile, build.build_timestamp
            ),
            None => format!("server: unreachable at {}", ctx.client.base_url()),
        };

        Ok(format!("{}\n{}", client, server))
    }
}

async fn fetch_server_build(ctx: &crate::cli::op::OpContext) -> Option<ServerBuild> {
    let url = ctx.client.base_url().join("/_status/version").ok()?;
    let response = ctx
        .client
        .http_client()
        .get(url)
        .timeout(SERVER_PROBE_TIMEOUT)
        .send()
        .await
        .ok()?;

    response.json::<ServerBuild>().await.ok()
}
