use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use pings_blob::{LocalBlobStore, UrlSigner};
use pings_db::{Database, DocumentStore};
use pings_notify::{Hub, Notifier};
use pings_types::events::Publication;
use pings_types::models::{CheckIn, DeviceToken, FamilyMember, MedicationLog, Photo, UserProfile};

use crate::state::{ApiConfig, AppStateInner};

/// A router over an in-memory database and a scratch blob directory, with
/// direct handles on each backend for assertions.
pub struct TestApp {
    pub app: Router,
    pub db: Arc<Database>,
    pub hub: Hub,
    pub blobs: Arc<LocalBlobStore>,
}

pub async fn test_app(config: ApiConfig) -> TestApp {
    let hub = Hub::new();
    let mut t = test_app_with(config, Arc::new(hub.clone())).await;
    t.hub = hub;
    t
}

pub async fn test_app_with(config: ApiConfig, notifier: Arc<dyn Notifier>) -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let (app, blobs) = build(config, db.clone(), notifier).await;
    TestApp {
        app,
        db,
        hub: Hub::new(),
        blobs,
    }
}

/// A router whose store fails every call. The returned hub observes any
/// publication the handlers still attempt.
pub async fn failing_store_app(config: ApiConfig) -> (Router, Hub) {
    let hub = Hub::new();
    let (app, _) = build(config, Arc::new(FailingStore), Arc::new(hub.clone())).await;
    (app, hub)
}

async fn build(
    config: ApiConfig,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
) -> (Router, Arc<LocalBlobStore>) {
    let dir = std::env::temp_dir().join(format!("pings-api-{}", uuid::Uuid::new_v4()));
    let signer = UrlSigner::new(b"test-secret").unwrap();
    let blobs = Arc::new(
        LocalBlobStore::new(dir, Url::parse("http://localhost").unwrap(), signer)
            .await
            .unwrap(),
    );

    let state = AppStateInner::new(store, blobs.clone(), notifier, config);
    (crate::router(state), blobs)
}

/// Error text a client must never see.
const STORE_FAULT: &str = "disk I/O error at checkins.db";

/// Fails every call the way a broken database would.
pub struct FailingStore;

impl DocumentStore for FailingStore {
    fn put_check_in(&self, _: &CheckIn) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn recent_check_ins(&self, _: &str, _: u32) -> anyhow::Result<Vec<CheckIn>> {
        Err(anyhow!(STORE_FAULT))
    }
    fn put_medication_log(&self, _: &MedicationLog) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn put_photo(&self, _: &Photo) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn get_photo(&self, _: &str) -> anyhow::Result<Option<Photo>> {
        Err(anyhow!(STORE_FAULT))
    }
    fn delete_photo(&self, _: &str) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn put_user(&self, _: &UserProfile) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn get_user(&self, _: &str) -> anyhow::Result<Option<UserProfile>> {
        Err(anyhow!(STORE_FAULT))
    }
    fn put_family_member(&self, _: &FamilyMember) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn delete_family_member(&self, _: &str, _: &str) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn put_device_token(&self, _: &DeviceToken) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn delete_device_token(&self, _: &str, _: &str) -> anyhow::Result<()> {
        Err(anyhow!(STORE_FAULT))
    }
    fn device_tokens(&self, _: &str) -> anyhow::Result<Vec<DeviceToken>> {
        Err(anyhow!(STORE_FAULT))
    }
}

/// Rejects every publication.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn publish(&self, _publication: Publication) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async { Err(anyhow!("transport unavailable")) })
    }
}

/// Send one JSON request and decode the JSON reply (`Null` when empty).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
