use std::error::Error;
use std::path::PathBuf;

use url::Url;

use granary_server::http_server::api::client::{ApiClient, ApiError};
use granary_server::state::AppState;

/// Resolve the remote URL for the API client.
///
/// Priority: explicit `--remote` flag > config file `remote` > hardcoded 4401.
pub fn resolve_remote(explicit: Option<Url>, config_path: Option<PathBuf>) -> Url {
    if let Some(url) = explicit {
        return url;
    }
    if let Ok(state) = AppState::load(config_path) {
        if let Some(url) = state.config.remote {
            return url;
        }
    }
    Url::parse("http://localhost:4401").expect("hardcoded URL must parse")
}

/// Resolve the bearer token for API calls.
///
/// Priority: explicit `--token` flag > config file `token` > none.
pub fn resolve_token(explicit: Option<String>, config_path: Option<PathBuf>) -> Option<String> {
    if explicit.is_some() {
        return explicit;
    }
    AppState::load(config_path)
        .ok()
        .and_then(|state| state.config.token)
}


#[derive(Clone)]
pub struct OpContext {
    /// API client (always initialized with default or custom URL)
    pub client: ApiClient,
    /// Resolved bearer token, for ops that persist or forward it
    pub token: Option<String>,
    /// Optional custom config path (defaults to ~/.granary)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    /// Create context with resolved remote URL, token and config path
    pub fn new(
        remote: Url,
        token: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(&remote, token.as_deref())?,
            token,
            config_path,
        })
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
