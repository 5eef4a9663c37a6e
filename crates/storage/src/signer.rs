use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use url::Url;

use crate::error::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters carried by every signed transfer URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedQuery {
    /// Unix timestamp (seconds) after which the URL is dead.
    pub expires: i64,
    /// Part number for multipart transfers, numbered from 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<u32>,
    /// Multipart session token issued at product creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,
    /// Hex HMAC-SHA256 over the canonical request string.
    pub sig: String,
}

/// Mints and verifies the signed URLs the transfer gateway accepts.
///
/// Signatures are stateless: the gateway recomputes the HMAC from the
/// request itself, so any server holding the shared secret can verify a
/// URL minted by any other.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    base: Url,
    secret: Vec<u8>,
}

impl UrlSigner {
    /// `base` is the public URL clients reach the gateway at.
    pub fn new(base: Url, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            base,
            secret: secret.into(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn sign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
        part: Option<u32>,
        upload: Option<&str>,
    ) -> Result<Url, StorageError> {
        self.sign("PUT", bucket, key, expires_at.timestamp(), part, upload)
    }

    pub fn sign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Url, StorageError> {
        self.sign("GET", bucket, key, expires_at.timestamp(), None, None)
    }

    /// Check a request the gateway received. `key` must be the decoded
    /// object key, exactly as it was signed.
    pub fn verify(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        query: &SignedQuery,
    ) -> Result<(), StorageError> {
        if Utc::now().timestamp() > query.expires {
            return Err(StorageError::Signature("url expired".into()));
        }

        let canonical = canonical_string(
            method,
            bucket,
            key,
            query.expires,
            query.part,
            query.upload.as_deref(),
        );
        let mut mac = self.mac()?;
        mac.update(canonical.as_bytes());

        let sig = hex::decode(&query.sig)
            .map_err(|_| StorageError::Signature("malformed signature".into()))?;
        mac.verify_slice(&sig)
            .map_err(|_| StorageError::Signature("signature mismatch".into()))
    }

    fn sign(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        expires: i64,
        part: Option<u32>,
        upload: Option<&str>,
    ) -> Result<Url, StorageError> {
        let canonical = canonical_string(method, bucket, key, expires, part, upload);
        let mut mac = self.mac()?;
        mac.update(canonical.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Config("gateway base url cannot be a base".into()))?
            .pop_if_empty()
            .push("o")
            .push(bucket)
            .extend(key.split('/'));
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("expires", &expires.to_string());
            if let Some(part) = part {
                pairs.append_pair("part", &part.to_string());
            }
            if let Some(upload) = upload {
                pairs.append_pair("upload", upload);
            }
            pairs.append_pair("sig", &sig);
        }
        Ok(url)
    }

    fn mac(&self) -> Result<HmacSha256, StorageError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| StorageError::Config("invalid signing secret".into()))
    }
}

fn canonical_string(
    method: &str,
    bucket: &str,
    key: &str,
    expires: i64,
    part: Option<u32>,
    upload: Option<&str>,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        bucket,
        key,
        expires,
        part.map(|p| p.to_string()).unwrap_or_default(),
        upload.unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signer() -> UrlSigner {
        UrlSigner::new(
            Url::parse("http://localhost:8701").unwrap(),
            b"test-secret".to_vec(),
        )
    }

    fn query_of(url: &Url) -> SignedQuery {
        let mut q = SignedQuery {
            expires: 0,
            part: None,
            upload: None,
            sig: String::new(),
        };
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "expires" => q.expires = v.parse().unwrap(),
                "part" => q.part = Some(v.parse().unwrap()),
                "upload" => q.upload = Some(v.into_owned()),
                "sig" => q.sig = v.into_owned(),
                other => panic!("unexpected query key {}", other),
            }
        }
        q
    }

    #[test]
    fn signed_put_verifies() {
        let signer = signer();
        let expires = Utc::now() + Duration::minutes(10);
        let url = signer
            .sign_put("granary", "abc/data.h5", expires, Some(2), Some("sess"))
            .unwrap();

        assert!(url.path().starts_with("/o/granary/abc/"));
        let q = query_of(&url);
        signer.verify("PUT", "granary", "abc/data.h5", &q).unwrap();
    }

    #[test]
    fn tampered_key_is_rejected() {
        let signer = signer();
        let expires = Utc::now() + Duration::minutes(10);
        let url = signer.sign_get("granary", "a/b.fits", expires).unwrap();
        let q = query_of(&url);

        let err = signer.verify("GET", "granary", "a/other.fits", &q).unwrap_err();
        assert!(matches!(err, StorageError::Signature(_)));
    }

    #[test]
    fn wrong_method_is_rejected() {
        let signer = signer();
        let expires = Utc::now() + Duration::minutes(10);
        let url = signer.sign_get("granary", "a/b", expires).unwrap();
        let q = query_of(&url);

        assert!(signer.verify("PUT", "granary", "a/b", &q).is_err());
    }

    #[test]
    fn expired_url_is_rejected() {
        let signer = signer();
        let expires = Utc::now() - Duration::minutes(1);
        let url = signer.sign_get("granary", "a/b", expires).unwrap();
        let q = query_of(&url);

        let err = signer.verify("GET", "granary", "a/b", &q).unwrap_err();
        assert!(matches!(err, StorageError::Signature(_)));
    }

    #[test]
    fn part_number_is_bound_into_signature() {
        let signer = signer();
        let expires = Utc::now() + Duration::minutes(10);
        let url = signer
            .sign_put("granary", "k", expires, Some(1), Some("sess"))
            .unwrap();
        let mut q = query_of(&url);
        q.part = Some(2);

        assert!(signer.verify("PUT", "granary", "k", &q).is_err());
    }
}
