use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use futures_util::future::BoxFuture;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::BlobStore;
use crate::signer::UrlSigner;

/// Filesystem-backed object store.
///
/// Each object is stored as a flat file at `{dir}/{key}`, where the key's `/`
/// separated segments become directories. Signed URLs point at the object
/// routes under `{public_url}/objects/{key}`.
pub struct LocalBlobStore {
    dir: PathBuf,
    public_url: Url,
    signer: UrlSigner,
}

impl LocalBlobStore {
    pub async fn new(dir: PathBuf, public_url: Url, signer: UrlSigner) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Blob storage directory: {}", dir.display());
        Ok(Self { dir, public_url, signer })
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Path to the file for a given key. Keys with empty, `.` or `..`
    /// segments are refused so nothing resolves outside the storage directory.
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.starts_with('/') {
            bail!("Invalid object key '{}'", key);
        }
        for segment in key.split('/') {
            let mut components = Path::new(segment).components();
            let single_normal = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if segment.is_empty() || !single_normal {
                bail!("Invalid object key '{}'", key);
            }
        }
        Ok(self.dir.join(key))
    }

    /// Store an object. The bytes land in a temporary file unique to this
    /// write and are renamed into place, so readers never see a partial
    /// object and concurrent writers never share a temp file.
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<u64> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(format!(".{}.part", Uuid::new_v4()));
        let tmp = PathBuf::from(tmp);
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        info!("Stored object {} ({} bytes)", key, data.len());
        Ok(data.len() as u64)
    }

    /// Open an object for reading, `None` if it does not exist.
    pub async fn open(&self, key: &str) -> Result<Option<(fs::File, u64)>> {
        let path = self.object_path(key)?;
        match fs::File::open(&path).await {
            Ok(file) => {
                let size = file.metadata().await?.len();
                Ok(Some((file, size)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object from disk.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted object {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Object {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn signed_url(&self, method: &str, key: &str, content_type: &str, expires_in: Duration) -> Result<String> {
        // Validate before handing out a URL for a key we would refuse to serve.
        self.object_path(key)?;

        let expires = i64::try_from(expires_in.as_secs())
            .ok()
            .and_then(|secs| chrono::Utc::now().timestamp().checked_add(secs))
            .ok_or_else(|| anyhow!("URL lifetime of {}s is out of range", expires_in.as_secs()))?;
        let signature = self.signer.sign(method, key, expires, content_type);

        let mut url = self.public_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Public URL '{}' cannot be a base", self.public_url))?;
            segments.pop_if_empty().push("objects");
            segments.extend(key.split('/'));
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expires", &expires.to_string());
            if !content_type.is_empty() {
                query.append_pair("contentType", content_type);
            }
            query.append_pair("signature", &signature);
        }

        Ok(url.into())
    }
}

impl BlobStore for LocalBlobStore {
    fn upload_url(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String> {
        self.signed_url("PUT", key, content_type, expires_in)
    }

    fn download_url(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String> {
        self.signed_url("GET", key, content_type, expires_in)
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.remove(key))
    }
}
