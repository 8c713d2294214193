//! Object storage for photo bytes.
//!
//! Clients never send photo bytes through the API handlers. The API asks a
//! [`BlobStore`] for a time-limited signed URL and the client talks to the
//! object routes directly.

pub mod routes;
pub mod signer;
pub mod storage;

use std::time::Duration;

use anyhow::Result;
use futures_util::future::BoxFuture;

pub use signer::{SignatureError, UrlSigner};
pub use storage::LocalBlobStore;

/// Blob store gateway used by the photo handler.
pub trait BlobStore: Send + Sync {
    /// Signed URL allowing `PUT` of `key` with the given content type until it expires.
    fn upload_url(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String>;

    /// Signed URL allowing `GET` of `key`, served back with `content_type`.
    fn download_url(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String>;

    /// Remove the object. Removing a missing object succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>>;
}
