//! Transfer plumbing shared by create and update: declare local files,
//! push their bytes through signed URLs, then complete and confirm.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reqwest::Client;
use url::Url;

use common::catalog::NewSource;
use common::prelude::{Checksum, Product, SourceFile};
use common::service::{CompleteUpload, PartReceipt};
use granary_server::http_server::api::client::{ApiClient, ApiError};
use granary_server::http_server::api::v0::product::complete::CompleteRequest;
use granary_server::http_server::api::v0::product::confirm::ConfirmRequest;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("file has no usable name: {0}")]
    BadFileName(PathBuf),
    #[error("two files declare the source name {0}")]
    DuplicateName(String),
    #[error("no upload URL issued for source {0}")]
    MissingUrls(String),
    #[error("no local file for source {0}")]
    MissingFile(String),
}

/// Declare one local file as a source: name from the file name, size and
/// checksum from the bytes.
pub fn declare(path: &Path) -> Result<NewSource, TransferError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TransferError::BadFileName(path.to_path_buf()))?
        .to_string();
    let bytes = std::fs::read(path)?;
    Ok(NewSource {
        name,
        size: bytes.len() as u64,
        checksum: Checksum::sha256_of(&bytes),
    })
}

/// Push local files through the node's signed write URLs, then complete
/// and confirm it. `files` maps source names to local paths; sources the
/// node carried over from a previous version have no URLs and no bytes to
/// move. Returns the confirmed product.
pub async fn push_and_confirm(
    client: &mut ApiClient,
    product: &Product,
    upload_urls: &BTreeMap<String, Vec<Url>>,
    files: &BTreeMap<String, PathBuf>,
) -> Result<Product, TransferError> {
    let http = client.http_client().clone();

    let mut receipts: BTreeMap<String, Vec<PartReceipt>> = BTreeMap::new();
    for source in product.sources.iter().filter(|s| !s.available) {
        let urls = upload_urls
            .get(&source.name)
            .ok_or_else(|| TransferError::MissingUrls(source.name.clone()))?;
        let path = files
            .get(&source.name)
            .ok_or_else(|| TransferError::MissingFile(source.name.clone()))?;
        receipts.insert(source.name.clone(), push_source(&http, source, urls, path).await?);
    }

    let completed = client
        .call(CompleteRequest {
            id: product.id,
            upload: CompleteUpload { receipts },
        })
        .await?;
    let confirmed = client.call(ConfirmRequest { id: completed.id }).await?;
    Ok(confirmed)
}

/// One PUT per part, in part order. The URLs were minted against the
/// source's declared part count, so the chunking must mirror the server's
/// batch arithmetic.
async fn push_source(
    http: &Client,
    source: &SourceFile,
    urls: &[Url],
    path: &Path,
) -> Result<Vec<PartReceipt>, TransferError> {
    let bytes = std::fs::read(path)?;
    let batch = source
        .multipart_batch_size
        .unwrap_or_else(|| (bytes.len() as u64).max(1)) as usize;

    let mut receipts = Vec::with_capacity(urls.len());
    for (index, url) in urls.iter().enumerate() {
        let start = usize::min(index * batch, bytes.len());
        let end = usize::min(start + batch, bytes.len());
        let chunk = bytes[start..end].to_vec();
        http.put(url.clone())
            .body(chunk)
            .send()
            .await?
            .error_for_status()?;
        receipts.push(PartReceipt {
            size: (end - start) as u64,
            etag: None,
        });
    }
    Ok(receipts)
}
