//! Shared fixtures for catalog service tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use url::Url;

use ::common::access::{Grants, Principal, ReadPolicy, StaticDirectory};
use ::common::catalog::NewSource;
use ::common::checksum::Checksum;
use ::common::service::{Catalog, CatalogOptions, CompleteUpload, PartReceipt, ProductCreated};
use ::common::store::MemoryCatalogStore;
use storage::{Storage, UrlSigner};

pub const BUCKET: &str = "granary";

/// A fully wired catalog over in-memory backends.
pub fn setup_catalog() -> Catalog {
    setup_catalog_with_policy(ReadPolicy::World)
}

pub fn setup_catalog_with_policy(read_policy: ReadPolicy) -> Catalog {
    let signer = UrlSigner::new(
        Url::parse("http://localhost:4402").unwrap(),
        b"test-signing-secret",
    );
    Catalog::new(
        Arc::new(MemoryCatalogStore::new()),
        Storage::memory(),
        signer,
        Arc::new(StaticDirectory::from_users(["alice", "bob", "carol"])),
        Grants::permissive(),
        CatalogOptions {
            bucket: BUCKET.to_string(),
            presign_ttl: Duration::minutes(10),
            read_policy,
        },
    )
}

pub fn alice() -> Principal {
    Principal::new("alice", ["users"])
}

pub fn bob() -> Principal {
    Principal::new("bob", ["users"])
}

pub fn admin() -> Principal {
    Principal::new("root", ["admin"])
}

/// A principal in no granted group at all.
pub fn stranger() -> Principal {
    Principal::new("mallory", Vec::<String>::new())
}

/// Declare a source for the given bytes.
pub fn declared(name: &str, bytes: &[u8]) -> NewSource {
    NewSource {
        name: name.to_string(),
        size: bytes.len() as u64,
        checksum: Checksum::sha256_of(bytes),
    }
}

/// Play the client's part of a transfer: push each source's bytes into
/// storage the way the gateway would (direct put for single-part, staged
/// parts for multipart), and return matching receipts.
pub async fn transfer(
    catalog: &Catalog,
    created: &ProductCreated,
    bodies: &[(&str, &[u8])],
) -> CompleteUpload {
    let storage = catalog.storage();
    let mut upload = CompleteUpload::default();
    for (name, body) in bodies {
        let source = created.product.source(name).expect("declared source");
        let mut receipts = Vec::new();
        if source.multipart {
            let upload_id = source.upload_id.as_deref().expect("upload session");
            let batch = source.multipart_batch_size.expect("batch size") as usize;
            for (index, chunk) in body.chunks(batch).enumerate() {
                storage
                    .put_part(
                        &source.bucket,
                        upload_id,
                        index as u32 + 1,
                        bytes::Bytes::copy_from_slice(chunk),
                    )
                    .await
                    .unwrap();
                receipts.push(PartReceipt {
                    size: chunk.len() as u64,
                    etag: None,
                });
            }
        } else {
            storage
                .put(
                    &source.bucket,
                    &source.key,
                    bytes::Bytes::copy_from_slice(body),
                )
                .await
                .unwrap();
            receipts.push(PartReceipt {
                size: body.len() as u64,
                etag: None,
            });
        }
        upload.receipts.insert(name.to_string(), receipts);
    }
    upload
}
