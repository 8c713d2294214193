use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("URL has expired")]
    Expired,

    #[error("URL signature is invalid")]
    Invalid,
}

/// HMAC-SHA256 signatures over (method, key, expiry, content type).
///
/// The content type is empty for downloads. Expiry is unix seconds.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl UrlSigner {
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(anyhow!("URL signing secret must not be empty"));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow!("Invalid URL signing secret: {}", e))?;
        Ok(Self { mac })
    }

    pub fn sign(&self, method: &str, key: &str, expires: i64, content_type: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(canonical(method, key, expires, content_type).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a signature against the request and the current time.
    pub fn verify(
        &self,
        method: &str,
        key: &str,
        expires: i64,
        content_type: &str,
        signature: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;

        let mut mac = self.mac.clone();
        mac.update(canonical(method, key, expires, content_type).as_bytes());
        mac.verify_slice(&provided).map_err(|_| SignatureError::Invalid)?;

        if now > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}

fn canonical(method: &str, key: &str, expires: i64, content_type: &str) -> String {
    format!("{}\n{}\n{}\n{}", method, key, expires, content_type)
}
