use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::put,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{error, warn};

use crate::signer::SignatureError;
use crate::storage::LocalBlobStore;

/// 25 MB upload limit for photos
const MAX_OBJECT_SIZE: usize = 25 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Content type does not match the signed URL")]
    ContentTypeMismatch,

    #[error("Object not found")]
    NotFound,

    #[error("Failed to process object request")]
    Internal(#[source] anyhow::Error),
}

impl IntoResponse for ObjectError {
    fn into_response(self) -> Response {
        let status = match &self {
            ObjectError::Signature(_) | ObjectError::ContentTypeMismatch => StatusCode::FORBIDDEN,
            ObjectError::NotFound => StatusCode::NOT_FOUND,
            ObjectError::Internal(e) => {
                error!("Object storage error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
    #[serde(default)]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}

/// `PUT`/`GET /objects/{*key}`, authorised by signed query parameters only.
pub fn routes(store: Arc<LocalBlobStore>) -> Router {
    Router::new()
        .route("/objects/{*key}", put(upload_object).get(download_object))
        .layer(DefaultBodyLimit::max(MAX_OBJECT_SIZE))
        .with_state(store)
}

/// PUT /objects/{*key}: raw object bytes; the request content type must be
/// the one the URL was signed for.
pub async fn upload_object(
    State(store): State<Arc<LocalBlobStore>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ObjectError> {
    let now = chrono::Utc::now().timestamp();
    store
        .signer()
        .verify("PUT", &key, query.expires, &query.content_type, &query.signature, now)
        .inspect_err(|e| warn!("Rejected upload of {}: {}", key, e))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != query.content_type {
        warn!(
            "Upload of {} sent content type '{}', signed for '{}'",
            key, content_type, query.content_type
        );
        return Err(ObjectError::ContentTypeMismatch);
    }

    let size = store.write(&key, &body).await.map_err(ObjectError::Internal)?;

    Ok(Json(StoredObject { key, size }))
}

/// GET /objects/{*key}: streams the stored bytes back with the content type
/// the URL was signed for.
pub async fn download_object(
    State(store): State<Arc<LocalBlobStore>>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<impl IntoResponse, ObjectError> {
    let now = chrono::Utc::now().timestamp();
    store
        .signer()
        .verify("GET", &key, query.expires, &query.content_type, &query.signature, now)
        .inspect_err(|e| warn!("Rejected download of {}: {}", key, e))?;

    let (file, size) = store
        .open(&key)
        .await
        .map_err(ObjectError::Internal)?
        .ok_or(ObjectError::NotFound)?;

    let content_type = if query.content_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        query.content_type
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}
