use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use pings_types::api::{Ack, PhotoRequest, PhotoResponse, PhotoUploadResponse};

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process photo request";

/// POST /photos: register photo metadata and hand out a signed upload URL.
pub async fn create_photo(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", req.user_id);
    let filename = required.take("filename", req.filename);
    let content_type = required.take("contentType", req.content_type);
    required.finish()?;

    let photo_id = validate::non_empty(req.photo_id);
    validate::key_segment("userId", &user_id)?;
    validate::key_segment("filename", &filename)?;
    if let Some(id) = &photo_id {
        validate::key_segment("photoId", id)?;
    }

    let photo = records::photo(user_id, photo_id, filename, content_type, req.metadata);

    let expiry = state.config.url_expiry;
    let upload_url = state
        .blobs
        .upload_url(&photo.storage_key, &photo.content_type, expiry)
        .or_internal(FAILURE)?;

    let row = photo.clone();
    state
        .with_store(move |store| store.put_photo(&row))
        .await
        .or_internal(FAILURE)?;

    info!("Photo {} registered for {}", photo.photo_id, photo.user_id);

    Ok((
        StatusCode::CREATED,
        Json(PhotoUploadResponse {
            photo_id: photo.photo_id,
            upload_url,
            expires_in: expiry.as_secs(),
        }),
    ))
}

/// GET /photos/{photoId}: metadata plus a signed download URL.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut required = Required::new();
    let photo_id = required.take("photoId", Some(photo_id));
    required.finish()?;

    let photo = state
        .with_store(move |store| store.get_photo(&photo_id))
        .await
        .or_internal(FAILURE)?
        .ok_or(ApiError::NotFound("Photo not found"))?;

    let url = state
        .blobs
        .download_url(&photo.storage_key, &photo.content_type, state.config.url_expiry)
        .or_internal(FAILURE)?;

    Ok(Json(PhotoResponse { photo, url }))
}

/// DELETE /photos/{photoId}: remove the object and its metadata.
/// Deleting an unknown photo succeeds.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut required = Required::new();
    let photo_id = required.take("photoId", Some(photo_id));
    required.finish()?;

    let id = photo_id.clone();
    let existing = state
        .with_store(move |store| store.get_photo(&id))
        .await
        .or_internal(FAILURE)?;

    if let Some(photo) = existing {
        state.blobs.delete(&photo.storage_key).await.or_internal(FAILURE)?;
        state
            .with_store(move |store| store.delete_photo(&photo.photo_id))
            .await
            .or_internal(FAILURE)?;
        info!("Photo {} deleted", photo_id);
    }

    Ok(Json(Ack::ok()))
}

/// GET or DELETE on `/photos` without an id.
pub async fn missing_photo_id() -> ApiError {
    ApiError::MissingFields(vec!["photoId"])
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use url::Url;

    use pings_db::DocumentStore;

    use crate::state::ApiConfig;
    use crate::test_support::{failing_store_app, send, test_app};

    #[tokio::test]
    async fn create_issues_upload_url_and_stores_metadata() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/photos",
            Some(json!({
                "userId": "dad-001",
                "photoId": "p1",
                "filename": "garden.jpg",
                "contentType": "image/jpeg",
                "metadata": { "caption": "Tomatoes" }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["photoId"], "p1");
        assert_eq!(body["expiresIn"], 3600);

        let upload = Url::parse(body["uploadUrl"].as_str().unwrap()).unwrap();
        assert_eq!(upload.path(), "/objects/photos/dad-001/p1-garden.jpg");

        let stored = t.db.get_photo("p1").unwrap().unwrap();
        assert_eq!(stored.storage_key, "photos/dad-001/p1-garden.jpg");
        assert_eq!(stored.metadata.unwrap()["caption"], "Tomatoes");
    }

    #[tokio::test]
    async fn generates_photo_id_when_absent() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/photos",
            Some(json!({ "userId": "dad-001", "filename": "a.png", "contentType": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let photo_id = body["photoId"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(photo_id).is_ok());
        assert!(t.db.get_photo(photo_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn create_requires_fields_and_safe_names() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::POST, "/photos", Some(json!({ "userId": "dad-001" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: filename, contentType");

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/photos",
            Some(json!({ "userId": "dad-001", "filename": "../../x.jpg", "contentType": "image/jpeg" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["filename"]));
    }

    #[tokio::test]
    async fn get_returns_metadata_and_download_url() {
        let t = test_app(ApiConfig::default()).await;
        send(
            &t.app,
            Method::POST,
            "/photos",
            Some(json!({ "userId": "dad-001", "photoId": "p1", "filename": "garden.jpg", "contentType": "image/jpeg" })),
        )
        .await;

        let (status, body) = send(&t.app, Method::GET, "/photos/p1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["photoId"], "p1");
        assert_eq!(body["filename"], "garden.jpg");
        assert_eq!(body["contentType"], "image/jpeg");

        let url = Url::parse(body["url"].as_str().unwrap()).unwrap();
        assert_eq!(url.path(), "/objects/photos/dad-001/p1-garden.jpg");
        assert!(url.query().unwrap().contains("signature="));
        assert!(url.query_pairs().any(|(k, v)| k == "contentType" && v == "image/jpeg"));
    }

    #[tokio::test]
    async fn get_unknown_photo_is_not_found() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::GET, "/photos/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Photo not found");
    }

    #[tokio::test]
    async fn missing_photo_id_is_bad_request() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::GET, "/photos", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: photoId");

        let (status, _) = send(&t.app, Method::DELETE, "/photos", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_removes_object_and_metadata() {
        let t = test_app(ApiConfig::default()).await;
        send(
            &t.app,
            Method::POST,
            "/photos",
            Some(json!({ "userId": "dad-001", "photoId": "p1", "filename": "garden.jpg", "contentType": "image/jpeg" })),
        )
        .await;
        t.blobs.write("photos/dad-001/p1-garden.jpg", b"jpeg").await.unwrap();

        let (status, body) = send(&t.app, Method::DELETE, "/photos/p1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        assert!(t.db.get_photo("p1").unwrap().is_none());
        assert!(t.blobs.open("photos/dad-001/p1-garden.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::DELETE, "/photos/never-existed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let t = test_app(ApiConfig::default()).await;

        let (status, _) = send(&t.app, Method::PUT, "/photos/p1", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&t.app, Method::PATCH, "/photos", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn store_failure_is_generic() {
        let (app, _) = failing_store_app(ApiConfig::default()).await;
        let failed = json!({ "error": "Failed to process photo request" });

        let (status, body) = send(
            &app,
            Method::POST,
            "/photos",
            Some(json!({ "userId": "dad-001", "photoId": "p1", "filename": "garden.jpg", "contentType": "image/jpeg" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, failed);

        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/photos/p1", None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, failed);
        }
    }
}
