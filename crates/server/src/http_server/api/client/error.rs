use reqwest::StatusCode;

/// Failures a catalog API call can surface on the client side.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("token is not a valid header value")]
    InvalidToken,
    #[error("no {kind} named {name} on the remote")]
    NameNotFound { kind: &'static str, name: String },
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}
