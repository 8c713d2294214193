use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::{info, warn};

use pings_types::api::UserProfileRequest;
use pings_types::models::{Role, UserProfile};

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::middleware::Claims;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process user request";

/// PUT /users/{userId}: create or replace a profile.
///
/// With auth enabled a caller may only write the profile named by their
/// token's subject.
pub async fn put_profile(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<UserProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if let Some(Extension(claims)) = &claims {
        if claims.sub != user_id {
            warn!("{} tried to write the profile of {}", claims.sub, user_id);
            return Err(ApiError::Forbidden);
        }
    }

    let mut required = Required::new();
    let name = required.take("name", req.name);
    let role = required.take("role", req.role);
    required.finish()?;

    let role: Role = validate::one_of("role", &role)?;
    let profile = records::user_profile(user_id, name, role, validate::non_empty(req.avatar));

    let row = profile.clone();
    state
        .with_store(move |store| store.put_user(&row))
        .await
        .or_internal(FAILURE)?;

    info!("Profile saved for {}", profile.user_id);
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use pings_db::DocumentStore;

    use crate::state::ApiConfig;
    use crate::test_support::{send, test_app};

    #[tokio::test]
    async fn upsert_replaces_profile() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(
            &t.app,
            Method::PUT,
            "/users/dad-001",
            Some(json!({ "name": "Dad", "role": "senior" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "dad-001");
        assert_eq!(body["name"], "Dad");

        send(
            &t.app,
            Method::PUT,
            "/users/dad-001",
            Some(json!({ "name": "Pops", "role": "senior", "avatar": "https://img/p.png" })),
        )
        .await;

        let stored = t.db.get_user("dad-001").unwrap().unwrap();
        assert_eq!(stored.name, "Pops");
        assert_eq!(stored.avatar.as_deref(), Some("https://img/p.png"));
    }

    #[tokio::test]
    async fn rejects_missing_name_and_bad_role() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::PUT, "/users/dad-001", Some(json!({ "role": "senior" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: name");

        let (status, body) = send(
            &t.app,
            Method::PUT,
            "/users/dad-001",
            Some(json!({ "name": "Dad", "role": "boss" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["role"]));
        assert!(t.db.get_user("dad-001").unwrap().is_none());
    }
}
