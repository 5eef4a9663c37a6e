pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "granary")]
#[command(about = "Versioned data products over object storage")]
pub struct Args {
    /// Catalog API base URL (default from config, then http://localhost:4401)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Bearer token for API calls (default from config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Path to the granary config directory (defaults to ~/.granary)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
