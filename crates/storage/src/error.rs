#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error("signature rejected: {0}")]
    Signature(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}
