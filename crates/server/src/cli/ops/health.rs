use clap::Args;

use granary_server::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:   {}", state.granary_dir.display()));
                lines.push("  config.toml: OK".to_string());
                match &state.config.remote {
                    Some(remote) => lines.push(format!("  remote:      {}", remote)),
                    None => lines.push("  remote:      (default)".to_string()),
                }
                lines.push(format!(
                    "  cache tiers: {} shared + private",
                    state.config.cache_tiers.len()
                ));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check catalog liveness
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Catalog ({}):", base));

        let healthz_url = format!("{}/_status/healthz", base.as_str().trim_end_matches('/'));
        match client.get(&healthz_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                lines.push("  healthz: OK".to_string());
            }
            Ok(resp) => {
                lines.push(format!("  healthz: UNHEALTHY ({})", resp.status()));
            }
            Err(_) => {
                lines.push("  healthz: NOT REACHABLE".to_string());
            }
        }

        // 3. Check the reported server build
        let version_url = format!("{}/_status/version", base.as_str().trim_end_matches('/'));
        match client.get(&version_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<serde_json::Value>().await {
                    Ok(info) => {
                        let version = info
                            .get("version")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        lines.push(format!("  version: {}", version));
                    }
                    Err(_) => lines.push("  version: (unreadable)".to_string()),
                }
            }
            Ok(resp) => {
                lines.push(format!("  version: UNHEALTHY ({})", resp.status()));
            }
            Err(_) => {
                lines.push("  version: NOT REACHABLE".to_string());
            }
        }

        Ok(lines.join("\n"))
    }
}
