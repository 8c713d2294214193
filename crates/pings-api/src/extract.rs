use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// JSON request body, read regardless of the request's content type.
///
/// An empty body counts as `{}` so that missing fields are reported by name.
/// Malformed JSON and wrongly typed fields are rejected with the offending
/// field path.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid("body", e.body_text()))?;

        parse_body(&bytes).map(JsonBody)
    }
}

pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        let path = e.path().to_string();
        warn!("Rejected request body at '{}': {}", path, e.inner());
        if path == "." || e.inner().is_syntax() || e.inner().is_eof() {
            ApiError::invalid("body", "Invalid JSON body")
        } else {
            ApiError::invalid(path.clone(), format!("Invalid value for {}", path))
        }
    })?;
    de.end().map_err(|_| ApiError::invalid("body", "Invalid JSON body"))?;

    Ok(value)
}
