use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{checkin, family, medications, notifications, photos, users};

/// The public API. Unknown paths get a JSON 404 and known paths reject
/// other methods with a JSON 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/checkin", post(checkin::create_check_in).fallback(method_not_allowed))
        .route("/medications", post(medications::log_medication).fallback(method_not_allowed))
        .route(
            "/photos",
            post(photos::create_photo)
                .get(photos::missing_photo_id)
                .delete(photos::missing_photo_id)
                .fallback(method_not_allowed),
        )
        .route(
            "/photos/{photo_id}",
            get(photos::get_photo)
                .delete(photos::delete_photo)
                .fallback(method_not_allowed),
        )
        .route(
            "/family",
            get(family::family_status)
                .post(family::update_membership)
                .fallback(method_not_allowed),
        )
        .route(
            "/notifications",
            post(notifications::handle_notification).fallback(method_not_allowed),
        )
        .route("/users/{user_id}", put(users::put_profile).fallback(method_not_allowed))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}
