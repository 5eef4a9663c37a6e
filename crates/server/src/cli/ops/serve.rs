use std::path::PathBuf;

use clap::Args;

use granary_server::service_config::ConfigError;
use granary_server::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Server config TOML; development defaults apply when not given
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override gateway server port (default from config)
    #[arg(long)]
    pub gateway_port: Option<u16>,

    /// Override the sqlite catalog path (in-memory catalog when neither
    /// this nor the config sets one)
    #[arg(long)]
    pub sqlite_path: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(port) = self.api_port {
            config.api_port = port;
        }
        if let Some(port) = self.gateway_port {
            config.gateway_port = port;
        }
        if let Some(path) = &self.sqlite_path {
            config.sqlite_path = Some(path.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }

        spawn_service(&config).await;
        Ok("service ended".to_string())
    }
}
